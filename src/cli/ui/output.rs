use console::style;

use crate::constants::nodes;

/// Terminal output with status glyphs; `quiet` silences everything but errors
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✓").green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    pub fn header(&self, message: &str) {
        if !self.quiet {
            println!("\n{}", style(message).bold().underlined());
        }
    }

    /// One finished pipeline stage
    pub fn stage(&self, node: &str, log: &str) {
        if !self.quiet {
            println!("  {:<10} {}", style(stage_label(node)).cyan(), style(log).dim());
        }
    }

    pub fn field(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {:<10} {}", style(key).bold(), value);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new(false)
    }
}

fn stage_label(node: &str) -> &str {
    match node {
        nodes::CLONER => "clone",
        nodes::MANAGER => "select",
        nodes::SUMMARIZER => "summarize",
        nodes::WRITER => "write",
        other => other,
    }
}
