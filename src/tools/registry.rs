//! Tool registry
//!
//! Holds the descriptor set built once at startup. Registration
//! failures are isolated: one malformed descriptor is logged and
//! skipped, the rest register normally. An include/exclude filter lets
//! a deployment expose a subset of the catalog without code changes.

use crate::errors::{BrokerError, Result};
use crate::tools::descriptor::ToolDescriptor;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Startup filter over logical tool names.
#[derive(Debug, Clone, Default)]
pub struct RegistryFilter {
    /// When non-empty, only these names are registered
    pub include: Vec<String>,

    /// Always skipped, applied after `include`
    pub exclude: Vec<String>,
}

impl RegistryFilter {
    pub fn admits(&self, logical_name: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|n| n == logical_name) {
            return false;
        }
        !self.exclude.iter().any(|n| n == logical_name)
    }
}

/// Registered tool descriptors, keyed by logical name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<ToolDescriptor>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a descriptor set, applying the filter and
    /// isolating per-descriptor failures.
    pub fn from_descriptors(descriptors: Vec<ToolDescriptor>, filter: &RegistryFilter) -> Self {
        let mut registry = Self::new();
        for descriptor in descriptors {
            if !filter.admits(&descriptor.logical_name) {
                info!(tool = %descriptor.logical_name, "excluded by registry filter");
                continue;
            }
            if let Err(e) = registry.register(descriptor) {
                warn!(error = %e, "skipping malformed descriptor");
            }
        }
        registry
    }

    /// Register one descriptor. Malformed or duplicate descriptors are
    /// rejected without affecting existing registrations.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<()> {
        if !descriptor.is_well_formed() {
            return Err(BrokerError::Config(format!(
                "malformed descriptor {:?}/{:?}",
                descriptor.logical_name, descriptor.executable_name
            )));
        }
        if self.tools.contains_key(&descriptor.logical_name) {
            return Err(BrokerError::Config(format!(
                "duplicate descriptor {:?}",
                descriptor.logical_name
            )));
        }
        info!(tool = %descriptor.logical_name, executable = %descriptor.executable_name, "registered tool");
        self.tools
            .insert(descriptor.logical_name.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Look up a descriptor by logical name.
    pub fn lookup(&self, logical_name: &str) -> Result<Arc<ToolDescriptor>> {
        self.tools
            .get(logical_name)
            .cloned()
            .ok_or_else(|| BrokerError::NotRegistered {
                name: logical_name.to_string(),
            })
    }

    pub fn contains(&self, logical_name: &str) -> bool {
        self.tools.contains_key(logical_name)
    }

    /// Registered logical names, sorted for stable output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<ToolDescriptor>> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::tools::catalog::builtin_descriptors;

    #[test]
    fn test_catalog_registration() {
        let registry =
            ToolRegistry::from_descriptors(builtin_descriptors(), &RegistryFilter::default());
        assert_eq!(registry.len(), builtin_descriptors().len());
        assert!(registry.contains("nmap"));
        assert!(registry.contains("hydra"));
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = ToolRegistry::new();
        let err = registry.lookup("ghost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotRegistered);
    }

    #[test]
    fn test_malformed_descriptor_isolated() {
        let descriptors = vec![
            ToolDescriptor::new("good", "good-bin"),
            ToolDescriptor::new("", "bad-bin"),
            ToolDescriptor::new("also-good", "also-good-bin"),
        ];
        let registry = ToolRegistry::from_descriptors(descriptors, &RegistryFilter::default());

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("good"));
        assert!(registry.contains("also-good"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolDescriptor::new("nmap", "nmap")).unwrap();
        assert!(registry.register(ToolDescriptor::new("nmap", "nmap2")).is_err());
        assert_eq!(registry.lookup("nmap").unwrap().executable_name, "nmap");
    }

    #[test]
    fn test_include_filter() {
        let filter = RegistryFilter {
            include: vec!["nmap".to_string(), "nikto".to_string()],
            exclude: vec![],
        };
        let registry = ToolRegistry::from_descriptors(builtin_descriptors(), &filter);

        assert_eq!(registry.names(), vec!["nikto", "nmap"]);
    }

    #[test]
    fn test_exclude_filter() {
        let filter = RegistryFilter {
            include: vec![],
            exclude: vec!["hydra".to_string(), "john".to_string()],
        };
        let registry = ToolRegistry::from_descriptors(builtin_descriptors(), &filter);

        assert!(!registry.contains("hydra"));
        assert!(!registry.contains("john"));
        assert!(registry.contains("nmap"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = RegistryFilter {
            include: vec!["nmap".to_string()],
            exclude: vec!["nmap".to_string()],
        };
        let registry = ToolRegistry::from_descriptors(builtin_descriptors(), &filter);
        assert!(registry.is_empty());
    }
}
