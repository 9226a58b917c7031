//! Argument groups and logging shared by the Stellar binaries.

pub mod common;
pub mod logging;

pub use common::{DatasetDirArgs, DatasetSelectArgs, RemoverArgs};
