//! Built-in tool catalog
//!
//! One descriptor per supported security tool. These are configuration
//! one-liners; the registry applies the deployment's include/exclude
//! filter on top.

use crate::tools::descriptor::ToolDescriptor;
use std::time::Duration;

/// Default descriptor set for a lab deployment.
pub fn builtin_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new("nmap", "nmap")
            .with_allowed_flags(["-p", "-sV", "-sT", "-sU", "-O", "-A", "-T4", "--script", "--top-ports"])
            .with_timeout(Duration::from_secs(600)),
        ToolDescriptor::new("masscan", "masscan")
            .with_allowed_flags(["-p", "--rate", "--ports"])
            .with_mandatory_prefix(["--rate", "100"])
            .with_timeout(Duration::from_secs(600)),
        ToolDescriptor::new("nikto", "nikto")
            .with_allowed_flags(["-h", "-p", "-Tuning", "-timeout"])
            .with_timeout(Duration::from_secs(900)),
        ToolDescriptor::new("gobuster", "gobuster")
            .with_allowed_flags(["-w", "-x", "-t", "--threads", "-u"])
            .with_timeout(Duration::from_secs(900)),
        ToolDescriptor::new("sqlmap", "sqlmap")
            .with_allowed_flags(["-u", "-p", "--level", "--risk", "--dbs", "--tables", "--technique"])
            .with_mandatory_prefix(["--batch"])
            .with_timeout(Duration::from_secs(1200)),
        ToolDescriptor::new("hydra", "hydra")
            .with_allowed_flags(["-l", "-L", "-P", "-s", "-f", "-V"])
            .with_mandatory_prefix(["-t", "4"])
            .with_timeout(Duration::from_secs(1800))
            .with_concurrency_limit(1),
        ToolDescriptor::new("john", "john")
            .with_allowed_flags(["--wordlist", "--format", "--rules", "--show"])
            .with_timeout(Duration::from_secs(3600))
            .with_concurrency_limit(1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtins_well_formed() {
        let descriptors = builtin_descriptors();
        assert!(!descriptors.is_empty());
        for desc in &descriptors {
            assert!(desc.is_well_formed(), "malformed builtin: {}", desc.logical_name);
        }
    }

    #[test]
    fn test_cracking_tools_serialized() {
        // CPU-bound crackers must never run more than one at a time
        let descriptors = builtin_descriptors();
        for name in ["hydra", "john"] {
            let desc = descriptors
                .iter()
                .find(|d| d.logical_name == name)
                .unwrap();
            assert_eq!(desc.concurrency_limit, 1);
        }
    }

    #[test]
    fn test_masscan_rate_limited() {
        let descriptors = builtin_descriptors();
        let masscan = descriptors
            .iter()
            .find(|d| d.logical_name == "masscan")
            .unwrap();
        assert_eq!(masscan.mandatory_prefix_arguments, vec!["--rate", "100"]);
    }

    #[test]
    fn test_unique_logical_names() {
        let descriptors = builtin_descriptors();
        let mut names: Vec<_> = descriptors.iter().map(|d| &d.logical_name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), descriptors.len());
    }
}
