//! One-off reorganizations of third-party data into the Stellar layout.
//!
//! Both operations move and delete files in place and cannot be undone.

pub mod celebamask;
pub mod fs_ops;
pub mod prompts;

pub use celebamask::{extract_stellar, ExtractReport};
pub use prompts::{place_prompts, PlacementReport};
