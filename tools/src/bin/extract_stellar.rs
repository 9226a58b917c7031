use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use cli_support::{logging, DatasetDirArgs};
use stellar_tools::{migrate, ToolConfig};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    name = "extract_stellar",
    about = "Reorganize a CelebAMask-HQ download into Stellar identity folders (irreversible)"
)]
struct Args {
    #[command(flatten)]
    dataset: DatasetDirArgs,
    /// CSV of CelebA-HQ filenames in Stellar with their split (defaults to the tools config).
    #[arg(long)]
    image_list: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = ToolConfig::load()?;
    logging::init(&cfg.log_filter)?;
    for warning in cfg.warnings() {
        warn!("tools config: {warning}");
    }

    let image_list = args.image_list.unwrap_or(cfg.celebahq_image_list);
    let report = migrate::extract_stellar(&args.dataset.dataset_dir, &image_list)?;
    println!(
        "Extraction complete: identities {}, images {}",
        report.identities, report.images
    );
    Ok(())
}
