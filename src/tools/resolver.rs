//! Executable resolution
//!
//! PATH lookup happens at call time, never cached, so operators can
//! install or remove tool binaries without restarting the broker.

use crate::errors::{BrokerError, Result};
use std::path::PathBuf;

/// Resolve a tool's executable name to an absolute path.
pub fn resolve(executable_name: &str) -> Result<PathBuf> {
    which::which(executable_name).map_err(|_| BrokerError::NotFound {
        executable: executable_name.to_string(),
    })
}
