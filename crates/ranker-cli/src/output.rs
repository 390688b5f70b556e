//! Output formatting for the CLI.

use console::style;
use ranker_core::{ChangeSet, Item};
use serde::Serialize;
use std::fmt::Write;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

/// Print output in the specified format.
pub fn print<T: Serialize + HumanDisplay + ?Sized>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Human => println!("{}", value.human_display()),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(value).expect("Failed to serialize to JSON")
            );
        }
        OutputFormat::Yaml => {
            println!(
                "{}",
                serde_yaml::to_string(value).expect("Failed to serialize to YAML")
            );
        }
    }
}

/// Print a success message.
pub fn print_success(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Human => println!("{message}"),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({"status": "ok", "message": message}));
        }
        OutputFormat::Yaml => {
            println!("status: ok\nmessage: {message}");
        }
    }
}

/// Trait for human-readable display.
pub trait HumanDisplay {
    fn human_display(&self) -> String;
}

impl HumanDisplay for Item {
    fn human_display(&self) -> String {
        format!(
            "{} [{}] {}",
            self.key(),
            self.category(),
            self.name().unwrap_or("-")
        )
    }
}

/// An ordered list of items, printed as a ranked table.
impl HumanDisplay for [Item] {
    fn human_display(&self) -> String {
        if self.is_empty() {
            return "No items.".to_string();
        }

        // Calculate max widths (with minimum for headers)
        let rank_width = self.len().to_string().len().max(1);
        let key_width = self.iter().map(|i| i.key().as_str().len()).max().unwrap_or(3).max(3);
        let type_width = "location".len();

        let mut out = String::new();
        writeln!(
            out,
            "{:>rank_w$}  {:<key_w$}  {:<type_w$}  {}",
            "#",
            "KEY",
            "TYPE",
            "NAME",
            rank_w = rank_width,
            key_w = key_width,
            type_w = type_width
        )
        .unwrap();
        writeln!(out, "{}", "-".repeat(rank_width + key_width + type_width + 20)).unwrap();

        for (index, item) in self.iter().enumerate() {
            writeln!(
                out,
                "{:>rank_w$}  {:<key_w$}  {:<type_w$}  {}",
                index,
                item.key(),
                item.category(),
                item.name().unwrap_or("-"),
                rank_w = rank_width,
                key_w = key_width,
                type_w = type_width
            )
            .unwrap();
        }

        out.trim_end().to_string()
    }
}

impl HumanDisplay for ChangeSet {
    fn human_display(&self) -> String {
        if self.is_empty() {
            return "No changes.".to_string();
        }

        let mut out = String::new();
        for (category, record) in self.iter() {
            let change = match record.new_priority {
                Some(priority) if record.is_aggregated => {
                    style(format!("→ {priority}")).green().to_string()
                }
                _ => style("removed").red().to_string(),
            };
            writeln!(out, "  {:<9} {}  {change}", category.to_string(), record.key).unwrap();
        }

        out.trim_end().to_string()
    }
}
