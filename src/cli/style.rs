//! Terminal styling helpers
//!
//! Output goes through `anstream`, which strips ANSI codes when the stream
//! is not a terminal, so styling here is unconditional.

use indicatif::ProgressStyle;
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Check mark used for completed steps
pub const CHECK: &str = "✓";

/// Cross used for failed steps
pub const CROSS: &str = "✗";

/// Semantic styles for CLI output
pub trait Stylize: Display + Sized {
    /// Secondary information
    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    /// Headings and important labels
    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    /// Names: branches, paths, refs
    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    /// Positive results
    fn success(&self) -> String {
        self.green().to_string()
    }

    /// Warnings
    fn warn(&self) -> String {
        self.yellow().to_string()
    }

    /// Failures
    fn failure(&self) -> String {
        self.red().to_string()
    }
}

impl<T: Display> Stylize for T {}

/// Green check mark
pub fn check() -> String {
    CHECK.success()
}

/// Red cross
pub fn cross() -> String {
    CROSS.failure()
}

/// Dimmed arrow for sub-items
pub fn arrow() -> String {
    "→".muted()
}

/// Spinner style for long-running remote calls
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "])
}

/// Render `url` as a terminal hyperlink when supported
pub fn hyperlink(text: &str, url: &str) -> String {
    if supports_hyperlinks::on(supports_hyperlinks::Stream::Stdout) {
        terminal_link::Link::new(text, url).to_string()
    } else {
        url.to_string()
    }
}
