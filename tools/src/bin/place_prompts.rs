use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use cli_support::{logging, DatasetDirArgs};
use stellar_tools::{migrate, ToolConfig};

#[derive(Parser, Debug)]
#[command(
    name = "place_prompts",
    about = "Write each subject's prompt group into its identity folder"
)]
struct Args {
    #[command(flatten)]
    dataset: DatasetDirArgs,
    /// JSON object of prompt groups keyed by identity folder name.
    #[arg(long)]
    prompts: Option<PathBuf>,
    /// Object vocabulary copied to the dataset root.
    #[arg(long)]
    objects: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = ToolConfig::load()?;
    logging::init(&cfg.log_filter)?;

    let catalog = args.prompts.unwrap_or(cfg.prompts_catalog);
    let objects = args.objects.unwrap_or(cfg.objects_list);
    let report = migrate::place_prompts(&args.dataset.dataset_dir, &catalog, &objects)?;
    println!("Placed prompts for {} subjects", report.subjects);
    Ok(())
}
