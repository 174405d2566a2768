use anyhow::Result;
use clap::Parser;
use histalert::{batch, cli::Cli, config::RunConfig};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; warnings always, everything with --debug
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    args.apply(&mut config);

    let analysis = batch::analyze(&config)?;

    // report before persisting so a failed save still shows this run's findings
    for line in &analysis.report.lines {
        println!("{}", line);
    }

    analysis.save_ledger(&config.ledger_path)
}
