//! toolgate - Secure tool-execution broker
//!
//! Lets an AI agent request allow-listed security tools (nmap, hydra,
//! sqlmap, ...) against lab targets while guaranteeing it can never
//! achieve command injection, reach unauthorized network ranges,
//! exhaust host resources, or hang the process pool.
//!
//! # Architecture
//!
//! - `tools`: validation, resolution, bounded execution, admission
//!   control, and audit for a single invocation
//! - `broker`: the dispatch loop and lifecycle owner
//! - `config` / `cli`: deployment surface

pub mod broker;
pub mod cli;
pub mod config;
pub mod errors;
pub mod tools;

// Re-export commonly used types
pub use broker::Broker;
pub use config::BrokerConfig;
pub use errors::{BrokerError, ErrorKind, Result};
pub use tools::{
    builtin_descriptors, AuditLogger, RegistryFilter, ToolDescriptor, ToolRegistry, ToolRequest,
    ToolResult,
};
