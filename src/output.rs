//! # Terminal Output
//!
//! Helpers for the human-readable output of the CLI. Colors and emoji are
//! enabled or disabled together, following the `--color` flag and the usual
//! environment conventions:
//! - `--color=always|never` overrides everything else
//! - `NO_COLOR` (set to anything, https://no-color.org/) disables colors
//! - `CLICOLOR=0` disables colors, `CLICOLOR_FORCE=1` forces them
//! - `TERM=dumb` disables colors
//!
//! ```
//! use s3_replication::output::{marker, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("never");
//! assert_eq!(marker(&out, "✅", "[OK]"), "[OK]");
//! assert_eq!(out.bucket("logs"), "logs");
//! ```

use std::env;

use console::style;

use crate::config::BucketRef;

/// Whether output should be decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolves the `--color` flag value ("always", "never" or "auto").
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    pub fn plain() -> Self {
        Self { use_color: false }
    }

    /// A bucket name, highlighted
    pub fn bucket(&self, name: &str) -> String {
        if self.use_color {
            style(name).cyan().bold().force_styling(true).to_string()
        } else {
            name.to_string()
        }
    }

    /// A bucket reference as `name (region)`
    pub fn bucket_ref(&self, bucket: &BucketRef) -> String {
        format!("{} ({})", self.bucket(&bucket.name), bucket.region)
    }

    /// A role name, highlighted
    pub fn role(&self, name: &str) -> String {
        if self.use_color {
            style(name).magenta().force_styling(true).to_string()
        } else {
            name.to_string()
        }
    }

    /// A section heading
    pub fn heading(&self, text: &str) -> String {
        if self.use_color {
            style(text).bold().force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Picks the emoji when output is decorated, the plain marker otherwise.
pub fn marker<'a>(config: &OutputConfig, emoji: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji
    } else {
        plain
    }
}
