//! Tool descriptors
//!
//! One `ToolDescriptor` per registered tool, built once at startup and
//! owned by the registry. Descriptors are configuration, not behavior:
//! the validator and executor read them, nothing mutates them.

use std::time::Duration;

/// Static description of one allow-listed tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    /// Stable identifier requests use to select this tool
    pub logical_name: String,

    /// File name of the underlying executable, resolved on PATH per call
    pub executable_name: String,

    /// Flag allowlist. `None` means any token that passes the sanitizer
    /// is accepted. When set, a flag token passes only if it exactly
    /// equals a declared prefix or extends it with `=` (so `-p` admits
    /// `-p` and `-p=80` but not `-psomething`).
    pub allowed_flag_prefixes: Option<Vec<String>>,

    /// Deadline when the request carries no override
    pub default_timeout: Duration,

    /// Maximum simultaneous in-flight executions of this tool
    pub concurrency_limit: usize,

    /// Safe defaults always prepended to the argv (rate limits etc.)
    pub mandatory_prefix_arguments: Vec<String>,
}

impl ToolDescriptor {
    pub fn new(logical_name: impl Into<String>, executable_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            executable_name: executable_name.into(),
            allowed_flag_prefixes: None,
            default_timeout: Duration::from_secs(300),
            concurrency_limit: 2,
            mandatory_prefix_arguments: Vec::new(),
        }
    }

    pub fn with_allowed_flags<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_flag_prefixes = Some(prefixes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_mandatory_prefix<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mandatory_prefix_arguments = args.into_iter().map(Into::into).collect();
        self
    }

    /// Check a flag token against the allowlist.
    ///
    /// Exact-or-`=`-boundary matching: plain prefix matching would let
    /// `-psomething` ride in on an allowed `-p`.
    pub fn flag_allowed(&self, token: &str) -> bool {
        match &self.allowed_flag_prefixes {
            None => true,
            Some(prefixes) => prefixes.iter().any(|p| {
                token == p || (token.starts_with(p.as_str()) && token[p.len()..].starts_with('='))
            }),
        }
    }

    /// Structural sanity check used by the registry at registration.
    pub fn is_well_formed(&self) -> bool {
        !self.logical_name.is_empty()
            && !self.executable_name.is_empty()
            && self.default_timeout > Duration::ZERO
            && self.concurrency_limit > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let desc = ToolDescriptor::new("nmap", "nmap")
            .with_allowed_flags(["-p", "-sV"])
            .with_timeout(Duration::from_secs(120))
            .with_concurrency_limit(3)
            .with_mandatory_prefix(["-T3"]);

        assert_eq!(desc.logical_name, "nmap");
        assert_eq!(desc.default_timeout, Duration::from_secs(120));
        assert_eq!(desc.concurrency_limit, 3);
        assert_eq!(desc.mandatory_prefix_arguments, vec!["-T3"]);
        assert!(desc.is_well_formed());
    }

    #[test]
    fn test_flag_exact_match() {
        let desc = ToolDescriptor::new("nmap", "nmap").with_allowed_flags(["-p", "-sV"]);

        assert!(desc.flag_allowed("-p"));
        assert!(desc.flag_allowed("-sV"));
        assert!(!desc.flag_allowed("-oX"));
    }

    #[test]
    fn test_flag_boundary_match() {
        let desc = ToolDescriptor::new("gobuster", "gobuster").with_allowed_flags(["--threads"]);

        assert!(desc.flag_allowed("--threads"));
        assert!(desc.flag_allowed("--threads=10"));
        // No boundary: must not match
        assert!(!desc.flag_allowed("--threadsX"));
    }

    #[test]
    fn test_flag_prefix_overreach_rejected() {
        let desc = ToolDescriptor::new("nmap", "nmap").with_allowed_flags(["-p"]);
        assert!(!desc.flag_allowed("-psomething"));
    }

    #[test]
    fn test_unrestricted_flags() {
        let desc = ToolDescriptor::new("john", "john");
        assert!(desc.flag_allowed("--wordlist=rockyou.txt"));
    }

    #[test]
    fn test_malformed_descriptors() {
        assert!(!ToolDescriptor::new("", "nmap").is_well_formed());
        assert!(!ToolDescriptor::new("nmap", "").is_well_formed());
        assert!(!ToolDescriptor::new("nmap", "nmap")
            .with_concurrency_limit(0)
            .is_well_formed());
        assert!(!ToolDescriptor::new("nmap", "nmap")
            .with_timeout(Duration::ZERO)
            .is_well_formed());
    }
}
