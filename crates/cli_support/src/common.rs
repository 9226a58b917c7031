use clap::Args;
use std::path::PathBuf;
use stellar_dataset::{CommandRemover, DatasetConfig, Layout, Split};

/// Dataset root taken by every migration and dataset tool.
#[derive(Debug, Clone, Args)]
pub struct DatasetDirArgs {
    /// Directory holding (or receiving) the Stellar identity folders.
    #[arg(long = "dataset-dir", alias = "dataset_dir")]
    pub dataset_dir: PathBuf,
}

/// Index selection overrides; unset flags fall back to the tool config.
#[derive(Debug, Clone, Default, Args)]
pub struct DatasetSelectArgs {
    /// Prompt layout: `simple` (prompt.json) or `targeted` (prompts_t/prompts_h).
    #[arg(long)]
    pub layout: Option<Layout>,
    /// Identity split for the targeted layout: all, val or test.
    #[arg(long)]
    pub split: Option<Split>,
    /// First identity ordinal treated as held-out.
    #[arg(long)]
    pub held_out_from: Option<u32>,
}

impl DatasetSelectArgs {
    pub fn apply(&self, base: DatasetConfig) -> DatasetConfig {
        DatasetConfig {
            layout: self.layout.unwrap_or(base.layout),
            split: self.split.unwrap_or(base.split),
            held_out_from: self.held_out_from.unwrap_or(base.held_out_from),
        }
    }
}

/// External background-removal command overrides.
#[derive(Debug, Clone, Default, Args)]
pub struct RemoverArgs {
    /// Program that reads an image on stdin and writes an RGBA cut-out on stdout.
    #[arg(long)]
    pub remover_program: Option<String>,
    /// Argument for the remover program (repeatable).
    #[arg(long = "remover-arg")]
    pub remover_args: Vec<String>,
}

impl RemoverArgs {
    /// Flags win over `base`; arguments are only replaced when a program is given.
    pub fn resolve(&self, base: CommandRemover) -> CommandRemover {
        match &self.remover_program {
            Some(program) => CommandRemover::new(program.clone(), self.remover_args.clone()),
            None => base,
        }
    }
}
