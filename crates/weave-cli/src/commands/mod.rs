//! Command implementations

use camino::Utf8PathBuf;
use std::collections::HashMap;
use tracing::{debug, info};
use weave_config::{ConfigLayering, ConfigLoader, ConfigSource, WeaveToml};
use weave_core::error::{WeaveError, WeaveResult};

use crate::output::OutputHandler;
use crate::Commands;

pub mod check;
pub mod resolve;

/// Shared state for every command
#[derive(Debug)]
pub struct CommandContext {
    /// Current working directory
    pub cwd: Utf8PathBuf,
    /// Configuration file given with `--config`
    pub config_path: Option<Utf8PathBuf>,
    /// Output handler
    pub output: OutputHandler,
}

impl CommandContext {
    /// Create new command context rooted at the process working directory
    pub async fn new(config_path: Option<Utf8PathBuf>) -> WeaveResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| WeaveError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| WeaveError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("Working directory is not valid UTF-8: {}", e),
        })?;

        Ok(Self {
            cwd,
            config_path,
            output: OutputHandler::new(),
        })
    }

    /// Load the layered configuration: global, then project or `--config`,
    /// then `WEAVE_*` environment variables, then `cli_overrides`
    pub async fn load_config(
        &self,
        cli_overrides: HashMap<String, String>,
    ) -> WeaveResult<(WeaveToml, ConfigSource)> {
        let loader = ConfigLoader::new(self.cwd.clone());

        let (project, source) = match &self.config_path {
            Some(path) => loader.load_explicit_config(path).await?,
            None => loader.load_project_config().await?,
        };
        let global = loader.load_global_config().await?;
        debug!(
            "Config source: {:?}, global config present: {}",
            source,
            global.is_some()
        );

        let config = ConfigLayering::merge_configs(
            global,
            project,
            ConfigLayering::collect_env_overrides(),
            cli_overrides,
        )?;
        Ok((config, source))
    }
}

/// Dispatch command to appropriate handler
pub async fn dispatch_command(command: Commands, context: &CommandContext) -> WeaveResult<()> {
    match command {
        Commands::Resolve(args) => {
            info!("Executing resolve command");
            resolve::execute(args, context).await
        },
        Commands::Check => {
            info!("Executing check command");
            check::execute(context).await
        },
        Commands::Version => {
            info!("Executing version command");
            show_version(context);
            Ok(())
        },
    }
}

fn show_version(context: &CommandContext) {
    context
        .output
        .plain(&format!("weave {}", env!("CARGO_PKG_VERSION")));
    context
        .output
        .info(&format!("Built: {}", env!("BUILD_DATE")));
    context.output.info(&format!(
        "Target: {}-{}",
        std::env::consts::ARCH,
        std::env::consts::OS
    ));
    context
        .output
        .info(&format!("Rust: {}", env!("RUSTC_VERSION")));
}

#[cfg(test)]
mod tests;
