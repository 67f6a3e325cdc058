use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fusionbot::app::App;
use fusionbot::codec::detect_image_format;
use fusionbot::generator::{GenerationService, Generator};
use fusionbot::models::Config;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fusionbot")]
#[command(about = "Telegram bot that generates images with FusionBrain")]
struct CliArgs {
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Run the Telegram bot (default).
    Run,
    /// Show which pipeline generations would use.
    Status,
    /// Generate a single image and write it to disk.
    Generate {
        /// Text prompt to render.
        prompt: String,
        /// Output file; defaults to `result.<ext>` based on the image format.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn output_path(explicit: Option<PathBuf>, default_dir: &Path, image: &[u8]) -> PathBuf {
    explicit.unwrap_or_else(|| {
        default_dir.join(format!("result.{}", detect_image_format(image).extension))
    })
}

/// Generates one image and writes it to `output` or `default_dir/result.<ext>`.
async fn generate_to_file(
    generator: &dyn GenerationService,
    prompt: &str,
    output: Option<PathBuf>,
    default_dir: &Path,
) -> Result<PathBuf> {
    let image = generator
        .generate(prompt.trim())
        .await
        .context("Generation failed")?;
    let path = output_path(output, default_dir, &image);
    tokio::fs::write(&path, &image)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved {} bytes to {}", image.len(), path.display());
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fusionbot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    match args.command.unwrap_or(CliCommand::Run) {
        CliCommand::Run => {
            info!("Starting fusionbot");
            let app = App::new(&config).context("Failed to initialize bot")?;
            app.run().await?;
        }
        CliCommand::Status => {
            let generator = Generator::from_config(&config.fusion, reqwest::Client::new());
            let pipeline = generator
                .check_model_available()
                .await
                .context("Model check failed")?;
            println!("{} (id {})", pipeline.display_name, pipeline.id);
        }
        CliCommand::Generate { prompt, output } => {
            let generator = Generator::from_config(&config.fusion, reqwest::Client::new());
            generate_to_file(&generator, &prompt, output, Path::new("")).await?;
        }
    }

    Ok(())
}
