use std::path::PathBuf;

use slotlist_config::SlotListConfig;
use slotlist_demo::{run_churn, run_walkthrough};
use slotlist_libs::{
    anyhow::{anyhow, Result},
    color_eyre, tracing, tracing_subscriber,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt, Clone)]
#[structopt()]
struct Cli {
    #[structopt(long)]
    config: Option<PathBuf>,
    #[structopt(long)]
    capacity: Option<u32>,
    #[structopt(long)]
    churn_rounds: Option<usize>,
    #[structopt(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    color_eyre::install().map_err(|e| anyhow!("failed to install color_eyre: {}", e))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("LOG_LEVEL"))
        .init();
    let args: Cli = Cli::from_args();

    let mut config = match &args.config {
        Some(path) => SlotListConfig::from_yaml_file(path)?,
        None => SlotListConfig::default(),
    };
    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    if let Some(churn_rounds) = args.churn_rounds {
        config.churn_rounds = churn_rounds;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    SlotListConfig::set_config(config)?;
    let config = SlotListConfig::get()?.read().clone();

    for (label, elements) in run_walkthrough(config.capacity)? {
        println!("{}:", label);
        if let Some(elements) = elements {
            println!("{}", elements);
        }
        println!();
    }

    if config.churn_rounds > 0 {
        let report = run_churn(&config)?;
        tracing::info!("churn finished: {:?}", report);
        println!(
            "churn: {} inserted, {} removed, {} rejected as full, {} live",
            report.inserted, report.removed, report.rejected, report.len
        );
    }

    Ok(())
}
