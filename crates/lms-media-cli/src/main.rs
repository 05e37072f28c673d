//! lms-media: drive the course media pipeline from a terminal.
//!
//! Configuration comes from the environment (and `.env`): UPLOAD_ENDPOINT,
//! STORAGE_BACKEND, FFMPEG_PATH, RESOLUTIONS, ...

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lms_media_cli::{describe_event, init_tracing, read_source};
use lms_media_core::{ComponentId, ErrorMetadata, MediaConfig, MediaError};
use lms_media_processing::{
    AssetEvent, AuthoringSession, CodecRuntime, FfmpegRuntime, LogNotifier, UploadValidator,
};
use lms_media_storage::{create_uploader, UploadRequest};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Parser)]
#[command(name = "lms-media", about = "Course media upload and transcoding CLI")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the codec engine and print its version
    Probe,
    /// Upload a file to storage and print its URL
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Destination folder (defaults to the intake folder for the file's type)
        #[arg(long)]
        folder: Option<String>,
    },
    /// Upload a video and generate every configured resolution
    Transcode {
        /// Path to the source video
        file: PathBuf,
        /// Component id used for progress output
        #[arg(long, default_value = "cli-video")]
        component: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn drain_events(events: &mut broadcast::Receiver<AssetEvent>) {
    while let Ok(event) = events.try_recv() {
        eprintln!("{}", describe_event(&event));
    }
}

fn user_facing(err: MediaError) -> anyhow::Error {
    anyhow::anyhow!("{} ({}): {}", err.client_message(), err.error_code(), err)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let config = MediaConfig::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Probe => {
            let runtime = FfmpegRuntime::from_config(&config.codec)
                .map_err(|e| user_facing(e.into()))?;
            runtime
                .ensure_loaded()
                .await
                .map_err(|e| user_facing(e.into()))?;
            let version = runtime
                .engine_info()
                .map(|info| info.version.clone())
                .unwrap_or_default();
            print_json(&serde_json::json!({
                "ffmpegPath": config.codec.ffmpeg_path,
                "version": version,
                "resolutions": config.codec.resolutions,
            }))?;
        }
        Commands::Upload { file, folder } => {
            let uploader = create_uploader(&config.storage)
                .await
                .map_err(|e| user_facing(e.into()))?;
            let asset = read_source(&file).await?;
            let folder = folder.unwrap_or_else(|| asset.kind().intake_folder().to_string());

            let outcome = uploader
                .upload(UploadRequest::new(
                    asset.data().clone(),
                    asset.content_type(),
                    asset.file_name(),
                    folder,
                ))
                .await
                .map_err(|e| user_facing(e.into()))?;
            print_json(&outcome)?;
        }
        Commands::Transcode { file, component } => {
            let uploader = create_uploader(&config.storage)
                .await
                .map_err(|e| user_facing(e.into()))?;
            let codec = FfmpegRuntime::from_config(&config.codec)
                .map_err(|e| user_facing(e.into()))?;
            let session = AuthoringSession::new(
                Arc::new(codec),
                uploader,
                Arc::new(LogNotifier),
                UploadValidator::from_config(&config.intake),
                config.codec.resolutions.clone(),
            );

            let component_id = ComponentId::new(component);
            session.open_component(&component_id);

            let mut events = session.subscribe();
            let asset = read_source(&file).await?;
            let intake = session.intake(&component_id, asset).await;
            drain_events(&mut events);
            intake.map_err(user_facing)?;

            let run = session.generate_resolutions(&component_id);
            tokio::pin!(run);
            let result = loop {
                tokio::select! {
                    result = &mut run => break result,
                    event = events.recv() => match event {
                        Ok(event) => eprintln!("{}", describe_event(&event)),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "Progress output lagged")
                        }
                        Err(RecvError::Closed) => {}
                    },
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupted, cancelling run");
                        session.cancel(&component_id);
                    }
                }
            };
            drain_events(&mut events);
            result.map_err(user_facing)?;

            let state = session
                .state(&component_id)
                .context("Component state missing after run")?;
            print_json(&state)?;
        }
    }

    Ok(())
}
