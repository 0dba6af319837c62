//! ANSI color support

use std::io::IsTerminal;

/// Whether colored output is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSupport {
    enabled: bool,
}

impl ColorSupport {
    /// Detect color support from `NO_COLOR` and whether stderr is a terminal
    pub fn detect() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn green(&self, text: &str) -> String {
        self.paint("32", text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint("33", text)
    }

    pub fn red(&self, text: &str) -> String {
        self.paint("31", text)
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }
}
