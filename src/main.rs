use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use rusty_eda::{Config, Envelope, Server, Session};

/// Exploratory data analysis server speaking line-delimited JSON on stdio.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Optional path to a JSON config file. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset to load before serving requests.
    #[arg(long)]
    load: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_deref().unwrap_or("info")),
    )
    .init();

    let mut session = Session::new(config.csv);
    if let Some(path) = &args.load {
        preload(&mut session, path);
    }

    log::info!("Serving on stdio");
    let mut server = Server::new(session);
    server.serve(std::io::stdin().lock(), std::io::stdout().lock())
}

/// Load `path` before serving. A failure is reported and the server starts
/// with an empty session.
fn preload(session: &mut Session, path: &Path) -> bool {
    match session.load(path) {
        Envelope::Success { .. } => true,
        Envelope::Error { message, .. } => {
            log::error!("--load {} failed, serving without a dataset: {message}", path.display());
            false
        }
    }
}
