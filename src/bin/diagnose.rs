use anyhow::{Context, Result};
use clap::Parser;

use fpl_axiom::app::AppContext;
use fpl_axiom::config::{self, Config};
use fpl_axiom::logging;

/// Fire the three-leg upstream probe once and print the report as JSON.
#[derive(Debug, Parser)]
#[command(name = "diagnose")]
struct Args {
    /// Print compact JSON instead of pretty.
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();
    let cfg = Config::from_env()?;
    logging::init(&cfg);

    let ctx = AppContext::from_config(cfg)?;
    let report = ctx.diagnostic.run();
    let out = if args.compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    }
    .context("failed to encode report")?;
    println!("{out}");
    Ok(())
}
