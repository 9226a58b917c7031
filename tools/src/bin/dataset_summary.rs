use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cli_support::{logging, DatasetSelectArgs};
use stellar_dataset::{summarize, SampleIndex};
use stellar_tools::ToolConfig;

#[derive(Parser, Debug)]
#[command(
    name = "dataset_summary",
    about = "Print the shape of a Stellar dataset, or one sample's metadata, as JSON"
)]
struct Args {
    /// Dataset root (defaults to the tools config).
    #[arg(long)]
    dataset_dir: Option<PathBuf>,
    #[command(flatten)]
    select: DatasetSelectArgs,
    /// Print the metadata record of this sample instead of the summary.
    #[arg(long)]
    sample: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = ToolConfig::load()?;
    logging::init(&cfg.log_filter)?;

    let root = args.dataset_dir.unwrap_or(cfg.dataset_dir);
    let index = SampleIndex::build(&root, &args.select.apply(cfg.dataset))
        .with_context(|| format!("index {}", root.display()))?;
    let json = match args.sample {
        Some(idx) => serde_json::to_string_pretty(&index.metadata(idx)?)?,
        None => serde_json::to_string_pretty(&summarize(&index))?,
    };
    println!("{json}");
    Ok(())
}
