//! Terminal output for the weave binary
//!
//! Status messages go to stderr so that resolved package lists on stdout can
//! be piped into other tools.

pub mod colors;
pub mod errors;

pub use colors::ColorSupport;
pub use errors::ErrorFormatter;

/// Output handler for CLI messages
#[derive(Debug, Clone)]
pub struct OutputHandler {
    colors: ColorSupport,
}

impl OutputHandler {
    /// Create new output handler with detected color support
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    /// Create an output handler with fixed color support
    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Print informational message
    pub fn info(&self, message: &str) {
        eprintln!("{}", self.colors.dim(message));
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.colors.green("✓"), message);
    }

    /// Print warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Print one line of command output to stdout, uncolored
    pub fn plain(&self, line: &str) {
        println!("{}", line);
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
