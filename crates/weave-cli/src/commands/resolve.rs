//! `weave resolve`: compute the full dependency set of the root packages

use camino::Utf8PathBuf;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use weave_config::{ResolverSection, WeaveToml};
use weave_core::error::{WeaveError, WeaveResult};
use weave_core::ConcretePackage;
use weave_registry::{CompositeProvider, DirectoryProvider, ManifestCache, ManifestProvider};
use weave_resolver::{ResolutionResult, Resolver, ResolverConfig};

use super::CommandContext;
use crate::ResolveArgs;

/// Execute resolve command
pub async fn execute(args: ResolveArgs, context: &CommandContext) -> WeaveResult<()> {
    let (config, _) = context.load_config(cli_overrides(&args)).await?;

    let roots = root_packages(&args.packages, &config)?;
    let directories = manifest_directories(&args.manifests, &config, context);
    if directories.is_empty() {
        return Err(WeaveError::ConfigValidation {
            field: "sources".to_string(),
            reason: "No manifest directories; pass --manifests or add a [[sources]] table"
                .to_string(),
        });
    }
    debug!("Manifest directories: {:?}", directories);

    let provider = build_provider(&directories, config.resolver.cache_manifests());
    let resolver = Resolver::new(provider, resolver_config(&config.resolver));
    let result = resolver.resolve(&roots).await?;

    render(&result, args.json, context)
}

/// Command-line flags expressed as configuration overrides
fn cli_overrides(args: &ResolveArgs) -> HashMap<String, String> {
    let mut overrides = HashMap::new();
    if args.no_cache {
        overrides.insert("cache-manifests".to_string(), "false".to_string());
    }
    if let Some(ms) = args.settle_timeout_ms {
        overrides.insert("settle-timeout-ms".to_string(), ms.to_string());
    }
    overrides
}

/// Packages named on the command line, or the `[roots]` table when none are
pub(crate) fn root_packages(
    specs: &[String],
    config: &WeaveToml,
) -> WeaveResult<Vec<ConcretePackage>> {
    let roots = if specs.is_empty() {
        config.root_packages()?
    } else {
        specs
            .iter()
            .map(|spec| spec.parse::<ConcretePackage>())
            .collect::<WeaveResult<Vec<_>>>()?
    };

    if roots.is_empty() {
        return Err(WeaveError::ConfigValidation {
            field: "roots".to_string(),
            reason: "Nothing to resolve; pass name@version or add a [roots] table".to_string(),
        });
    }
    Ok(roots)
}

/// `--manifests` directories first, then configured sources
pub(crate) fn manifest_directories(
    flags: &[Utf8PathBuf],
    config: &WeaveToml,
    context: &CommandContext,
) -> Vec<Utf8PathBuf> {
    let mut directories: Vec<Utf8PathBuf> = flags
        .iter()
        .map(|path| {
            if path.is_relative() {
                context.cwd.join(path)
            } else {
                path.clone()
            }
        })
        .collect();

    for path in config.source_paths() {
        if !directories.contains(&path) {
            directories.push(path);
        }
    }
    directories
}

pub(crate) fn build_provider(directories: &[Utf8PathBuf], cache: bool) -> Arc<dyn ManifestProvider> {
    let composite = directories
        .iter()
        .fold(CompositeProvider::new(), |composite, dir| {
            composite.with_source(Arc::new(DirectoryProvider::new(dir.clone())))
        });

    if cache {
        Arc::new(ManifestCache::new(Arc::new(composite)))
    } else {
        Arc::new(composite)
    }
}

pub(crate) fn resolver_config(section: &ResolverSection) -> ResolverConfig {
    ResolverConfig {
        mailbox_capacity: section.mailbox_capacity(),
        manifest_timeout: section.manifest_timeout(),
        settle_timeout: section.settle_timeout(),
    }
}

fn render(result: &ResolutionResult, json: bool, context: &CommandContext) -> WeaveResult<()> {
    if json {
        let rendered = serde_json::to_string_pretty(result)
            .map_err(|e| WeaveError::provider("Failed to serialize resolution".to_string(), e))?;
        context.output.plain(&rendered);
        return Ok(());
    }

    for package in &result.packages {
        context.output.plain(&package.to_string());
    }
    context.output.success(&format!(
        "Resolved {} package(s) in {}ms",
        result.package_count, result.resolution_time_ms
    ));
    Ok(())
}
