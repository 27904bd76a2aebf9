//! webplane - HTML panels as clickable planes in a 3D scene
//!
//! Headless demo: runs a scripted session against an in-memory document and
//! scene, logging frames, clicks and errors.

mod config;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use config::DemoConfig;
use std::path::PathBuf;
use tracing::info;
use webplane_testkit::JsonlSink;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a scripted webplane panel session", long_about = None)]
struct Args {
    /// Session configuration (TOML).
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Write the default configuration to `--config` and exit.
    #[arg(long)]
    write_default_config: bool,

    /// Append host-visible events as JSON lines.
    #[arg(long)]
    events: Option<PathBuf>,

    /// Save the last presented frame as a PNG.
    #[arg(long)]
    png: Option<PathBuf>,
}

fn main() -> Result<()> {
    // WARN by default, override via RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting webplane v{}", env!("CARGO_PKG_VERSION"));
    webplane_ui3d::init()?;

    let args = Args::parse();
    if args.write_default_config {
        DemoConfig::default()
            .save_to_path(&args.config)
            .with_context(|| format!("writing {}", args.config.display()))?;
        println!("wrote {}", args.config.display());
        return Ok(());
    }

    let config = DemoConfig::load_from_path(&args.config);
    let mut sink = args.events.as_deref().map(JsonlSink::create).transpose()?;
    let report = session::run(&config, sink.as_mut())?;
    if let Some(sink) = sink.as_mut() {
        sink.flush()?;
    }

    println!(
        "frames: {}, clicks: {}, invoked: [{}], errors: {}",
        report.frames,
        report.clicks.len(),
        report.invoked.join(", "),
        report.errors.len()
    );
    for err in &report.errors {
        println!("  error: {err}");
    }

    if let Some(path) = args.png {
        let frame = report
            .last_frame
            .context("no frame was presented, nothing to save")?;
        frame
            .image()
            .save(&path)
            .with_context(|| format!("saving frame to {}", path.display()))?;
        info!(path = %path.display(), "frame saved");
    }
    Ok(())
}
