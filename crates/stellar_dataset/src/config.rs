//! Index construction options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Identities with an ordinal at or above this value form the held-out subset.
pub const DEFAULT_HELD_OUT_FROM: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One `prompt.json` per identity.
    #[default]
    Simple,
    /// `prompts_t.json` for every identity plus `prompts_h.json` for held-out ones.
    Targeted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    #[default]
    All,
    /// Skip identities below the held-out threshold.
    Val,
    /// Stop at the first identity at or above the held-out threshold.
    Test,
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Layout::Simple),
            "targeted" => Ok(Layout::Targeted),
            other => Err(format!("unknown layout `{other}` (expected simple|targeted)")),
        }
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Split::All),
            "val" => Ok(Split::Val),
            "test" => Ok(Split::Test),
            other => Err(format!("unknown split `{other}` (expected all|val|test)")),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layout::Simple => "simple",
            Layout::Targeted => "targeted",
        })
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Split::All => "all",
            Split::Val => "val",
            Split::Test => "test",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub layout: Layout,
    /// Only consulted for `Layout::Targeted`.
    pub split: Split,
    pub held_out_from: u32,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            layout: Layout::Simple,
            split: Split::All,
            held_out_from: DEFAULT_HELD_OUT_FROM,
        }
    }
}

impl DatasetConfig {
    /// Read `STELLAR_LAYOUT`, `STELLAR_SPLIT` and `STELLAR_HELD_OUT_FROM`; unset or
    /// unparsable values keep their defaults.
    pub fn from_env() -> Self {
        fn parse<T: FromStr>(key: &str) -> Option<T>
        where
            T::Err: fmt::Display,
        {
            let raw = std::env::var(key).ok()?;
            match raw.parse() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("ignoring {key}={raw}: {e}");
                    None
                }
            }
        }
        let defaults = Self::default();
        DatasetConfig {
            layout: parse("STELLAR_LAYOUT").unwrap_or(defaults.layout),
            split: parse("STELLAR_SPLIT").unwrap_or(defaults.split),
            held_out_from: parse("STELLAR_HELD_OUT_FROM").unwrap_or(defaults.held_out_from),
        }
    }

    pub fn is_held_out(&self, ordinal: u32) -> bool {
        self.layout == Layout::Targeted && ordinal >= self.held_out_from
    }
}
