//! Printers for command results.

use std::io;

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use serde_json::Value;

pub struct JsonPrinter {
    pub pretty: bool,
    pub color: bool,
}

impl Default for JsonPrinter {
    fn default() -> Self {
        let tty = io::stdout().is_terminal();
        Self { pretty: tty, color: tty }
    }
}

impl JsonPrinter {
    pub fn render(&self, value: &Value) -> String {
        let text = if self.pretty {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        } else {
            value.to_string()
        };
        if self.color {
            format!("{}", text.green())
        } else {
            text
        }
    }

    pub fn print(&self, value: &Value) {
        println!("{}", self.render(value));
    }
}

/// Progress lines go to stderr so stdout stays machine-readable.
pub fn progress(message: &str) {
    if io::stderr().is_terminal() {
        eprintln!("{}", message.cyan());
    } else {
        eprintln!("{}", message);
    }
}
