//! Error rendering for terminal output

use std::error::Error;
use weave_core::error::WeaveError;

use super::ColorSupport;

/// Formats errors with their cause chain and a hint when one is known
#[derive(Debug, Clone)]
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Render an error, every underlying cause and an optional hint
    pub fn format_error(&self, error: &WeaveError) -> String {
        let mut output = format!("{}: {}", self.colors.red(&self.colors.bold("error")), error);

        let mut source = error.source();
        while let Some(cause) = source {
            output.push_str(&format!("\n  {} {}", self.colors.dim("caused by:"), cause));
            source = cause.source();
        }

        if let Some(suggestion) = error.suggestion() {
            output.push_str(&format!("\n  {} {}", self.colors.dim("help:"), suggestion));
        }

        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
