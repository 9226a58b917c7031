use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use stellar_dataset::{CommandRemover, DatasetConfig, Layout, Split};

const DEFAULT_CONFIG_NAME: &str = "stellar-tools.toml";
const CONFIG_ENV: &str = "STELLAR_TOOLS_CONFIG";

#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub dataset_dir: PathBuf,
    pub prompts_catalog: PathBuf,
    pub objects_list: PathBuf,
    pub celebahq_image_list: PathBuf,
    pub dataset: DatasetConfig,
    pub remover: CommandRemover,
    /// Worker threads for mask generation; `None` lets rayon decide.
    pub mask_workers: Option<usize>,
    pub log_filter: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("data/stellar"),
            prompts_catalog: PathBuf::from("prompts/prompts.json"),
            objects_list: PathBuf::from("prompts/objects.txt"),
            celebahq_image_list: PathBuf::from("images/celebahq_images.txt"),
            dataset: DatasetConfig::default(),
            remover: CommandRemover::default(),
            mask_workers: None,
            log_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ToolConfigFile {
    dataset_dir: Option<String>,
    log_filter: Option<String>,
    prompts: Option<PromptsSection>,
    celebamask: Option<CelebAMaskSection>,
    dataset: Option<DatasetSection>,
    remover: Option<RemoverSection>,
    masks: Option<MasksSection>,
}

#[derive(Debug, Deserialize, Default)]
struct PromptsSection {
    catalog: Option<String>,
    objects: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CelebAMaskSection {
    image_list: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DatasetSection {
    layout: Option<Layout>,
    split: Option<Split>,
    held_out_from: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct RemoverSection {
    program: Option<String>,
    args: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct MasksSection {
    workers: Option<usize>,
}

impl ToolConfig {
    /// `$STELLAR_TOOLS_CONFIG`, else `./stellar-tools.toml`, else defaults.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_path(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_NAME);
        if local.exists() {
            return Self::from_path(local);
        }
        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read tools config {}", path.display()))?;
        let file: ToolConfigFile = toml::from_str(&raw)
            .with_context(|| format!("parse tools config {}", path.display()))?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: ToolConfigFile) -> Self {
        let defaults = Self::default();
        let prompts = file.prompts.unwrap_or_default();
        let dataset = file.dataset.unwrap_or_default();
        let remover = file.remover.unwrap_or_default();

        let remover = match remover.program {
            Some(program) => CommandRemover::new(program, remover.args.unwrap_or_default()),
            None => CommandRemover {
                args: remover.args.unwrap_or(defaults.remover.args),
                ..defaults.remover
            },
        };

        ToolConfig {
            dataset_dir: file
                .dataset_dir
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.dataset_dir),
            prompts_catalog: prompts
                .catalog
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.prompts_catalog),
            objects_list: prompts
                .objects
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.objects_list),
            celebahq_image_list: file
                .celebamask
                .and_then(|c| c.image_list)
                .map(|v| expand_path(&v))
                .unwrap_or(defaults.celebahq_image_list),
            dataset: DatasetConfig {
                layout: dataset.layout.unwrap_or(defaults.dataset.layout),
                split: dataset.split.unwrap_or(defaults.dataset.split),
                held_out_from: dataset
                    .held_out_from
                    .unwrap_or(defaults.dataset.held_out_from),
            },
            remover,
            mask_workers: file.masks.and_then(|m| m.workers).filter(|w| *w > 0),
            log_filter: file
                .log_filter
                .filter(|f| !f.trim().is_empty())
                .unwrap_or(defaults.log_filter),
        }
    }

    /// Problems worth reporting once logging is up.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.remover.program.trim().is_empty() {
            out.push("remover.program is empty; mask generation will fail".to_string());
        }
        if self.dataset.layout == Layout::Simple && self.dataset.split != Split::All {
            out.push(format!(
                "dataset.split = {} has no effect with the simple layout",
                self.dataset.split
            ));
        }
        out
    }
}

fn expand_path(raw: &str) -> PathBuf {
    let mut out = raw.to_string();
    if let Some(stripped) = out.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME") {
            out = format!("{home}{stripped}");
        }
    }
    PathBuf::from(expand_env(&out))
}

/// Replace `${VAR}` with its value; unknown variables are left untouched.
fn expand_env(input: &str) -> String {
    let mut out = String::new();
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let key = &rest[start + 2..start + 2 + len];
        match std::env::var(key) {
            Ok(val) => out.push_str(&val),
            Err(_) => out.push_str(&rest[start..start + len + 3]),
        }
        rest = &rest[start + len + 3..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_env_vars_are_kept() {
        assert_eq!(
            expand_env("${STELLAR_SURELY_UNSET_VAR}/x"),
            "${STELLAR_SURELY_UNSET_VAR}/x"
        );
        assert_eq!(expand_env("plain/${"), "plain/${");
    }

    #[test]
    fn known_env_vars_expand() {
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(expand_env("a${PATH}b"), format!("a{path}b"));
    }
}
