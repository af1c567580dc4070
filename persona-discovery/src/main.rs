//! persona-discovery - Character Discovery service
//!
//! Serves the session and search API over the SQLite Session Store.
//! Source adapters and the Generation Service are provided by the deployment
//! that embeds the library; run standalone, the service has no sources and
//! every generation request reports the service as unavailable.
//!
//! Usage: `persona-discovery [CONFIG_FILE]`

use anyhow::Result;
use async_trait::async_trait;
use persona_discovery::extraction::{
    GenerationError, GenerationOptions, GenerationOutput, GenerationService,
};
use persona_discovery::DiscoveryConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

struct UnconfiguredGeneration;

#[async_trait]
impl GenerationService for UnconfiguredGeneration {
    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<GenerationOutput, GenerationError> {
        Err(GenerationError::Unavailable(
            "no generation service configured".to_string(),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DiscoveryConfig::load(config_path.as_deref())?;
    persona_common::logging::init_tracing(&config.logging)?;

    info!("Starting persona-discovery (Character Discovery)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    persona_discovery::serve(config, Vec::new(), Arc::new(UnconfiguredGeneration)).await
}
