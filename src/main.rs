use std::{net::Ipv4Addr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf_summary::{
    api, config, logging,
    processing::{ProcessingService, UploadedFile},
};
use tokio::net::TcpListener;

/// Multipart framing overhead allowed on top of the file payloads.
const MULTIPART_SLACK_BYTES: usize = 1024 * 1024;

#[derive(Parser)]
#[command(
    name = "pdf-summary",
    about = "Summarize PDFs with Gemini and store the results in SQLite"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Overrides `SERVER_PORT`.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Process local PDF files as one batch and print the batch result as JSON.
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("invalid configuration")?;
    logging::init_tracing();

    let service = ProcessingService::new(config)
        .await
        .context("failed to initialize processing service")?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.server_port);
            let body_limit = config
                .max_upload_files
                .saturating_mul(config.max_file_size_bytes())
                .saturating_add(MULTIPART_SLACK_BYTES);
            let app = api::create_router(Arc::new(service), body_limit);

            let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
                .await
                .with_context(|| format!("failed to bind port {port}"))?;
            tracing::info!("Listening on http://0.0.0.0:{}", port);
            axum::serve(listener, app).await.context("server error")?;
        }
        Command::Ingest { paths } => {
            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
                files.push(UploadedFile { filename, bytes });
            }

            let response = service
                .process_batch(files)
                .await
                .context("batch rejected")?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
