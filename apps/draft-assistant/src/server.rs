//! Assistant context shared by every tool call

use std::sync::Arc;

use template_core::config::DEFAULT_K;
use template_core::{RetrievalConfig, RetrievalService};

/// The draft assistant: an initialised retrieval service plus tool defaults
#[derive(Clone)]
pub struct DraftAssistant {
    /// Assistant name
    name: String,
    /// Assistant version
    version: String,
    /// Shared, read-only retrieval service
    service: Arc<RetrievalService>,
    /// `k` used when a search call omits it
    default_k: usize,
}

impl DraftAssistant {
    /// Wrap an already built retrieval service
    pub fn new(service: RetrievalService) -> Self {
        Self {
            name: "draft-assistant".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            service: Arc::new(service),
            default_k: DEFAULT_K,
        }
    }

    /// Build the service described by `config`
    pub fn from_config(config: &RetrievalConfig) -> template_core::Result<Self> {
        Ok(Self::new(config.build_service()?).with_default_k(config.default_k))
    }

    /// Create with a custom default result count
    pub fn with_default_k(mut self, default_k: usize) -> Self {
        self.default_k = default_k;
        self
    }

    /// Get assistant name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get assistant version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get default k
    pub fn default_k(&self) -> usize {
        self.default_k
    }

    /// Shared handle to the retrieval service
    pub fn service(&self) -> &Arc<RetrievalService> {
        &self.service
    }
}

impl std::fmt::Debug for DraftAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftAssistant")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("templates", &self.service.len())
            .field("default_k", &self.default_k)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let assistant = DraftAssistant::from_config(&RetrievalConfig::default()).unwrap();
        assert_eq!(assistant.name(), "draft-assistant");
        assert_eq!(assistant.default_k(), 3);
        assert_eq!(assistant.service().len(), 18);
    }

    #[test]
    fn test_clones_share_service() {
        let assistant = DraftAssistant::from_config(&RetrievalConfig::default()).unwrap();
        let clone = assistant.clone().with_default_k(7);
        assert!(Arc::ptr_eq(assistant.service(), clone.service()));
        assert_eq!(clone.default_k(), 7);
    }
}
