//! Tool invocation pipeline
//!
//! Modules:
//! - `types`: request/result values and sentinel exit codes
//! - `descriptor` / `catalog`: static tool configuration
//! - `registry`: descriptor lookup with startup filtering
//! - `validate`: target and argument gate (pure)
//! - `resolver`: per-call PATH lookup
//! - `executor`: bounded subprocess execution
//! - `limiter`: per-tool-class admission control
//! - `audit`: masked append-only invocation log

pub mod audit;
pub mod catalog;
pub mod descriptor;
pub mod executor;
pub mod limiter;
pub mod registry;
pub mod resolver;
pub mod types;
pub mod validate;

pub use audit::{AuditLogger, AuditRecord, Outcome};
pub use catalog::builtin_descriptors;
pub use descriptor::ToolDescriptor;
pub use executor::ProcessExecutor;
pub use limiter::ConcurrencyLimiter;
pub use registry::{RegistryFilter, ToolRegistry};
pub use types::{SanitizedCommand, ToolRequest, ToolResult};
pub use validate::TargetPolicy;
