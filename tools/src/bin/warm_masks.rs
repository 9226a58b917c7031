use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli_support::{logging, DatasetSelectArgs, RemoverArgs};
use rayon::prelude::*;
use stellar_dataset::{summarize, StellarDataset};
use stellar_tools::ToolConfig;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "warm_masks",
    about = "Generate every missing foreground mask ahead of evaluation"
)]
struct Args {
    /// Dataset root (defaults to the tools config).
    #[arg(long)]
    dataset_dir: Option<PathBuf>,
    #[command(flatten)]
    select: DatasetSelectArgs,
    #[command(flatten)]
    remover: RemoverArgs,
    /// Worker threads; 0 lets rayon pick.
    #[arg(long)]
    workers: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = ToolConfig::load()?;
    logging::init(&cfg.log_filter)?;
    for warning in cfg.warnings() {
        warn!("tools config: {warning}");
    }

    let root = args.dataset_dir.unwrap_or_else(|| cfg.dataset_dir.clone());
    let dataset = StellarDataset::builder(&root)
        .config(args.select.apply(cfg.dataset))
        .remover(args.remover.resolve(cfg.remover.clone()))
        .build()
        .with_context(|| format!("index {}", root.display()))?;

    let before = summarize(dataset.index()).cached_masks;
    let images = dataset.index().images().len();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.workers.or(cfg.mask_workers).unwrap_or(0))
        .build()
        .context("build worker pool")?;
    // Each task owns a distinct image, so no two workers write the same mask.
    let failures: Vec<_> = pool.install(|| {
        (0..images)
            .into_par_iter()
            .filter_map(|i| dataset.ensure_mask(i).err().map(|e| (i, e)))
            .collect()
    });
    for (i, err) in &failures {
        error!(image = %dataset.index().images()[*i].path.display(), "{err}");
    }

    let after = summarize(dataset.index()).cached_masks;
    info!(
        images,
        generated = after.saturating_sub(before),
        failed = failures.len(),
        "mask warm-up done"
    );
    println!(
        "Masks cached: {after}/{images} (generated {}, failed {})",
        after.saturating_sub(before),
        failures.len()
    );
    if !failures.is_empty() {
        bail!("{} masks could not be generated", failures.len());
    }
    Ok(())
}
