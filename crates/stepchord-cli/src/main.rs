//! stepchord: step-sequenced piano roll and chord engine

mod config;
mod parser;
mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use stepchord_core::Session;
use stepchord_services::{Engine, LoggingPlayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stepchord", about = "Step-sequenced piano roll with a music-theory engine")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/stepchord/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override tempo (BPM)
    #[arg(long)]
    bpm: Option<f64>,

    /// Seed for humanize and random arpeggios
    #[arg(long)]
    seed: Option<u64>,

    /// Write the effective configuration and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they don't interleave with REPL output
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("stepchord=debug".parse()?)
            .add_directive("stepchord_core=debug".parse()?)
            .add_directive("stepchord_services=info".parse()?))
        .init();

    let mut app_config = config::load_config(cli.config.as_deref())?;
    if let Some(bpm) = cli.bpm {
        app_config.session.bpm = bpm;
    }
    if let Some(seed) = cli.seed {
        app_config.session.seed = Some(seed);
    }

    if cli.write_config {
        let path = cli.config.unwrap_or_else(config::config_path);
        config::save_config(&app_config, &path)?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    tracing::info!("Starting stepchord");

    let ctx = parser::ParseContext {
        default_octave: app_config.session.default_octave,
    };
    let session = Session::new(app_config.session);
    let mut engine = Engine::new(session, Arc::new(LoggingPlayer));

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    repl::run(&mut engine, ctx, stdin.lock(), &mut stdout)?;
    engine.shutdown();
    Ok(())
}
