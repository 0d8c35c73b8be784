use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::GramflowConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "gramflow.toml",
    "gramflow.yaml",
    "gramflow.yml",
    "gramflow.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<GramflowConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./gramflow.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/gramflow/gramflow.{toml,yaml,yml,json}` (user-global)
///
/// Returns `GramflowConfig::default()` if no config file is found.
pub fn discover_and_load() -> GramflowConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    GramflowConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/gramflow/
    if let Some(dirs) = directories::ProjectDirs::from("", "", "gramflow") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/gramflow/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "gramflow").map(|d| d.config_dir().to_path_buf())
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gramflow.toml")
}

/// Serialize `config` to TOML and write it to the user-global config path.
///
/// Creates parent directories if needed. Returns the path written to.
pub fn save_config(config: &GramflowConfig) -> anyhow::Result<PathBuf> {
    let path = find_or_default_config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
    std::fs::write(&path, toml_str)?;
    debug!(path = %path.display(), "saved config");
    Ok(path)
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<GramflowConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_toml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gramflow.toml");
        std::fs::write(
            &path,
            r#"
            [scheduler]
            timezone = "Europe/Paris"

            [store]
            jobs_path = "jobs.json"
            "#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.scheduler.timezone, "Europe/Paris");
        assert_eq!(cfg.store.jobs_path.to_str().unwrap(), "jobs.json");
        // Untouched sections fall back to defaults.
        assert_eq!(cfg.media.ffmpeg_binary, "ffmpeg");
    }

    #[test]
    fn load_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gramflow.json");
        std::fs::write(&path, r#"{"scheduler": {"timezone": "UTC"}}"#).unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.scheduler.timezone, "UTC");
    }

    #[test]
    fn unresolved_env_placeholder_left_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gramflow.toml");
        std::fs::write(
            &path,
            "[scheduler]\ntimezone = \"${GRAMFLOW_LOADER_NONEXISTENT_TZ}\"\n",
        )
        .unwrap();

        // Placeholder survives so the error surfaces at timezone parse, not
        // silently as a default.
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.scheduler.timezone, "${GRAMFLOW_LOADER_NONEXISTENT_TZ}");
    }

    #[test]
    fn missing_file_errors() {
        assert!(load_config(Path::new("/nonexistent/gramflow.toml")).is_err());
    }
}
