//! `weave check`: validate configuration and manifest sources

use std::collections::HashMap;
use weave_config::ConfigSource;
use weave_core::error::WeaveResult;

use super::CommandContext;

/// Load the layered configuration and report what it resolves to.
///
/// Invalid configuration is an error; missing source directories only warn.
pub async fn execute(context: &CommandContext) -> WeaveResult<()> {
    let (config, source) = context.load_config(HashMap::new()).await?;
    let output = &context.output;

    match &source {
        ConfigSource::Project(path) | ConfigSource::Explicit(path) => {
            output.info(&format!("Configuration: {}", path));
        },
        ConfigSource::Defaults => output.info("Configuration: built-in defaults"),
    }

    let roots = config.root_packages()?;
    output.info(&format!("Roots: {}", roots.len()));
    for root in &roots {
        output.info(&format!("  {}", root));
    }

    let sources = config.source_paths();
    if sources.is_empty() {
        output.warn("No manifest sources configured; pass --manifests to 'weave resolve'");
    }
    let mut missing = 0;
    for path in &sources {
        if path.is_dir() {
            output.info(&format!("Source: {}", path));
        } else {
            missing += 1;
            output.warn(&format!("Source directory does not exist: {}", path));
        }
    }

    let resolver = &config.resolver;
    output.info(&format!(
        "Mailbox capacity: {}, manifest cache: {}",
        resolver.mailbox_capacity(),
        if resolver.cache_manifests() { "on" } else { "off" }
    ));

    if missing == 0 {
        output.success("Configuration is valid");
    } else {
        output.success(&format!(
            "Configuration is valid ({} source(s) missing)",
            missing
        ));
    }
    Ok(())
}
