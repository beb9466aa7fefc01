//! Output formatter for human-readable and JSON output
//!
//! Every command prints through a [`Formatter`] so JSON mode, quiet mode
//! and colors behave the same everywhere. In JSON mode stdout carries
//! exactly one JSON document and errors go to stderr as `{"error": ...}`.

use comfy_table::presets::NOTHING;
use comfy_table::{ContentArrangement, Table};
use console::Style;
use serde::Serialize;

use super::OutputConfig;

/// What a piece of text is, for choosing its style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Dir,
    File,
    Size,
    Date,
    /// Property keys in key/value listings
    Key,
    Url,
    /// Profile, bucket and object names
    Name,
    /// Objects readable without a token
    Public,
    Success,
    Error,
    Warning,
}

/// Color theme; a plain theme styles nothing
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    colored: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self { colored: true }
    }
}

impl Theme {
    pub fn plain() -> Self {
        Self { colored: false }
    }

    pub fn style(&self, role: Role) -> Style {
        if !self.colored {
            return Style::new();
        }
        match role {
            Role::Dir => Style::new().blue().bold(),
            Role::File => Style::new(),
            Role::Size => Style::new().green(),
            Role::Date => Style::new().dim(),
            Role::Key => Style::new().cyan(),
            Role::Url => Style::new().cyan().underlined(),
            Role::Name => Style::new().bold(),
            Role::Public | Role::Warning => Style::new().yellow(),
            Role::Success => Style::new().green(),
            Role::Error => Style::new().red(),
        }
    }
}

/// Formatter for CLI output
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
    theme: Theme,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        let theme = if config.no_color || config.json {
            Theme::plain()
        } else {
            Theme::default()
        };
        Self { config, theme }
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Apply the style of `role` to `text`
    pub fn paint(&self, role: Role, text: &str) -> String {
        self.theme.style(role).apply_to(text).to_string()
    }

    pub fn style_dir(&self, text: &str) -> String {
        self.paint(Role::Dir, text)
    }

    pub fn style_file(&self, text: &str) -> String {
        self.paint(Role::File, text)
    }

    pub fn style_size(&self, text: &str) -> String {
        self.paint(Role::Size, text)
    }

    pub fn style_date(&self, text: &str) -> String {
        self.paint(Role::Date, text)
    }

    pub fn style_url(&self, text: &str) -> String {
        self.paint(Role::Url, text)
    }

    pub fn style_name(&self, text: &str) -> String {
        self.paint(Role::Name, text)
    }

    /// Style an access permission as the service reports it
    pub fn style_access(&self, permission: &str) -> String {
        if permission.eq_ignore_ascii_case("public") {
            self.paint(Role::Public, permission)
        } else {
            permission.to_string()
        }
    }

    /// Print rows as a borderless table.
    ///
    /// Headers stay unstyled: escape codes would throw off column widths.
    pub fn table(&self, header: &[&str], rows: Vec<Vec<String>>) {
        if self.config.quiet {
            return;
        }

        let mut table = Table::new();
        table
            .load_preset(NOTHING)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header.to_vec());
        for row in rows {
            table.add_row(row);
        }
        println!("{table}");
    }

    /// Print `key: value` with keys padded to `width`
    pub fn key_value(&self, key: &str, width: usize, value: &str) {
        let key = self.paint(Role::Key, &format!("{key:<width$}:"));
        self.println(&format!("{key} {value}"));
    }

    /// Human-mode confirmation; JSON mode reports success through the document
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        println!("{} {message}", self.paint(Role::Success, "✓"));
    }

    /// Errors are printed even in quiet mode
    pub fn error(&self, message: &str) {
        if self.config.json {
            let doc = serde_json::json!({ "error": message });
            match serde_json::to_string_pretty(&doc) {
                Ok(text) => eprintln!("{text}"),
                Err(_) => eprintln!("{message}"),
            }
            return;
        }
        eprintln!("{} {message}", self.paint(Role::Error, "✗"));
    }

    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        eprintln!("{} {message}", self.paint(Role::Warning, "⚠"));
    }

    /// Print `value` as the JSON document of this invocation
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}
