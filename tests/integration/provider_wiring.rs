//! Building a provider-backed orchestrator from configuration.

use sitesmith::config::SitesmithConfig;
use sitesmith::error::ApiError;
use sitesmith::pipeline::PipelineOrchestrator;
use sitesmith::provider::{ProviderConfig, ProviderType};

fn ollama(model: &str) -> ProviderConfig {
    ProviderConfig {
        provider_type: ProviderType::Ollama,
        model: model.to_string(),
        api_key: None,
        api_key_env: None,
        endpoint: Some("http://localhost:11434".to_string()),
    }
}

#[test]
fn local_providers_need_no_keys() {
    let mut config = SitesmithConfig::default();
    config.providers.fast = ollama("llama3.2");
    config.providers.quality = ollama("qwen2.5-coder");
    assert!(PipelineOrchestrator::from_config(&config).is_ok());
}

#[test]
fn hosted_provider_without_key_is_not_configured() {
    let mut config = SitesmithConfig::default();
    config.providers.fast = ollama("llama3.2");
    config.providers.quality.api_key_env = Some("SITESMITH_TEST_UNSET_KEY".to_string());
    let result = PipelineOrchestrator::from_config(&config);
    assert!(matches!(result, Err(ApiError::ProviderNotConfigured(_))));
}

#[test]
fn broken_catalog_path_fails_wiring() {
    let mut config = SitesmithConfig::default();
    config.providers.fast = ollama("llama3.2");
    config.providers.quality = ollama("llama3.2");
    config.catalog.path = Some("/nonexistent/sitesmith/catalog.toml".into());
    let result = PipelineOrchestrator::from_config(&config);
    assert!(matches!(result, Err(ApiError::CatalogError(_))));
}
