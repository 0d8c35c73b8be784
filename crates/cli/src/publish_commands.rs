//! `run` and `post`: the scheduler loop and on-demand publishing.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use {anyhow::Context, clap::Args, tracing::info};

use {
    gramflow_config::GramflowConfig,
    gramflow_cron::{FileStore, FireOutcome, MediaKind, PublishFn, SchedulerService},
    gramflow_media::{ImageRenderer, MediaRenderer, RenderSpec},
    gramflow_publish::{
        AccountCredentials, HttpPlatformClient, PublishPipeline, PublishRequest,
    },
};

#[derive(Args)]
pub struct PostArgs {
    /// Account name from the config's account table.
    #[arg(long)]
    pub account: String,
    /// Media file to publish.
    #[arg(long)]
    pub media: PathBuf,
    #[arg(long, default_value = "")]
    pub caption: String,
    /// Treat the media as video (otherwise inferred from the extension).
    #[arg(long, default_value_t = false)]
    pub video: bool,
    /// Cover image for video posts; derived from the video when absent.
    #[arg(long)]
    pub thumbnail: Option<PathBuf>,
    /// Logo to watermark into image posts.
    #[arg(long)]
    pub logo: Option<PathBuf>,
    /// Text overlay for image posts (needs an SVG-capable renderer).
    #[arg(long)]
    pub overlay_text: Option<String>,
}

/// Resolve credentials for every account that has a password configured.
fn credential_table(config: &GramflowConfig) -> HashMap<String, AccountCredentials> {
    config
        .accounts
        .iter()
        .filter_map(|account| {
            account.password.clone().map(|password| {
                (account.name.clone(), AccountCredentials {
                    username: account.username.clone(),
                    password,
                })
            })
        })
        .collect()
}

fn resolve_credentials(config: &GramflowConfig, name: &str) -> anyhow::Result<AccountCredentials> {
    credential_table(config)
        .remove(name)
        .with_context(|| format!("no credentials configured for account '{name}'"))
}

fn build_pipeline(config: &GramflowConfig) -> PublishPipeline<HttpPlatformClient> {
    PublishPipeline::new(HttpPlatformClient::new(config.platform.base_url.clone()))
        .with_ffmpeg_binary(config.media.ffmpeg_binary.clone())
}

pub fn media_kind_for(path: &PathBuf, video_flag: bool) -> MediaKind {
    if video_flag {
        return MediaKind::Video;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4" | "mov" | "m4v" | "webm") => MediaKind::Video,
        _ => MediaKind::Image,
    }
}

/// Start the tick loop and block until Ctrl-C.
pub async fn run_scheduler(config: &GramflowConfig) -> anyhow::Result<()> {
    let timezone = config
        .scheduler
        .parsed_timezone()
        .map_err(|e| anyhow::anyhow!(e))?;

    let store = Arc::new(FileStore::new(config.store.jobs_path.clone()));
    let pipeline = Arc::new(build_pipeline(config));
    let credentials = Arc::new(credential_table(config));

    let on_publish: PublishFn = Arc::new(move |job| {
        let pipeline = Arc::clone(&pipeline);
        let credentials = Arc::clone(&credentials);
        Box::pin(async move {
            let Some(creds) = credentials.get(&job.account) else {
                return FireOutcome {
                    success: false,
                    message: format!("no credentials configured for account '{}'", job.account),
                };
            };
            let request = PublishRequest::from(&job);
            let outcome = pipeline.publish(&request, creds).await;
            FireOutcome {
                success: outcome.success,
                message: outcome.message,
            }
        })
    });

    let service = SchedulerService::new(store, timezone, on_publish);
    service.start().await?;
    info!("scheduler running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    service.stop().await;
    Ok(())
}

/// Publish right now, bypassing the tick matcher.
pub async fn post_now(config: &GramflowConfig, args: PostArgs) -> anyhow::Result<()> {
    let credentials = resolve_credentials(config, &args.account)?;
    let media_kind = media_kind_for(&args.media, args.video);

    // Images optionally go through the renderer first; the processed copy
    // lands in the uploads dir and becomes the published artifact.
    let media_path = if media_kind == MediaKind::Image
        && (args.logo.is_some() || args.overlay_text.is_some())
    {
        let base = tokio::fs::read(&args.media)
            .await
            .with_context(|| format!("failed to read {}", args.media.display()))?;
        let logo = match &args.logo {
            Some(path) => Some(
                tokio::fs::read(path)
                    .await
                    .with_context(|| format!("failed to read logo {}", path.display()))?,
            ),
            None => None,
        };

        let rendered = ImageRenderer::new().render(&base, &RenderSpec {
            overlay_text: args.overlay_text.clone(),
            logo,
        })?;

        tokio::fs::create_dir_all(&config.store.uploads_dir).await?;
        let processed = config
            .store
            .uploads_dir
            .join(format!("{}_processed.jpg", uuid::Uuid::new_v4()));
        tokio::fs::write(&processed, &rendered).await?;
        processed
    } else {
        args.media.clone()
    };

    let request = PublishRequest {
        media_path,
        media_kind,
        caption: args.caption,
        thumbnail_path: args.thumbnail,
    };

    let outcome = build_pipeline(config).publish(&request, &credentials).await;
    if outcome.success {
        println!("{}", outcome.message);
        Ok(())
    } else {
        anyhow::bail!(outcome.message)
    }
}
