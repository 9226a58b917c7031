use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One prompt-group sidecar (`prompt.json`, `prompts_t.json` or `prompts_h.json`).
///
/// `detectables` and `categories` run parallel to `prompts` when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptGroupFile {
    pub prompts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detectables: Option<Vec<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("`{field}` has {found} entries but `prompts` has {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

impl PromptGroupFile {
    /// Check that every annotation list present is parallel to `prompts`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let expected = self.prompts.len();
        for (field, list) in [
            ("detectables", &self.detectables),
            ("categories", &self.categories),
        ] {
            if let Some(list) = list {
                if list.len() != expected {
                    return Err(ValidationError::LengthMismatch {
                        field,
                        expected,
                        found: list.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate and additionally require the annotation lists targeted prompts carry.
    pub fn validate_annotated(&self, require_categories: bool) -> Result<(), ValidationError> {
        if self.detectables.is_none() {
            return Err(ValidationError::MissingField("detectables"));
        }
        if require_categories && self.categories.is_none() {
            return Err(ValidationError::MissingField("categories"));
        }
        self.validate()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}
