//! `generate`: AI caption and image generation.

use clap::Subcommand;

use {
    gramflow_config::GramflowConfig,
    gramflow_content::{ContentGenerator, HttpContentGenerator},
};

#[derive(Subcommand)]
pub enum GenerateAction {
    /// Generate a caption from a prompt.
    Text { prompt: String },
    /// Generate an image from a prompt (translated to English first).
    Image { prompt: String },
}

pub async fn handle(config: &GramflowConfig, action: GenerateAction) -> anyhow::Result<()> {
    let generator = HttpContentGenerator::new(
        config.generator.text.clone(),
        config.generator.image.clone(),
        config.store.uploads_dir.clone(),
    );

    match action {
        GenerateAction::Text { prompt } => {
            let text = generator.generate_text(&prompt).await?;
            println!("{text}");
        },
        GenerateAction::Image { prompt } => {
            let path = generator.generate_image(&prompt).await?;
            println!("{}", path.display());
        },
    }

    Ok(())
}
