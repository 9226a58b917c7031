//! Shared data contracts for the Stellar dataset layout: per-image attribute
//! records, prompt-group sidecars, and the file naming rules tying them together.

pub mod attributes;
pub mod layout;
pub mod prompts;

pub use attributes::AttributesRecord;
pub use prompts::{PromptGroupFile, ValidationError};
