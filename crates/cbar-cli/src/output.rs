//! Output formatting for cbar-cli (table, json)

use cbar_core::{AggregateBarringState, BarringCategory};
use cbar_ril::facility_code;
use cbar_session::SCAN_ORDER;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        }
    }

    /// Parse a config file value, falling back to table
    pub fn from_config(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print the barring state in the configured format
    pub fn print_state(&self, state: &AggregateBarringState) {
        match self.format {
            OutputFormat::Table => {
                let table = Table::new(state_rows(state)).to_string();
                println!("{}", table);
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(state).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
    }

    /// Print an operation result as JSON, or as a colored line for tables
    pub fn print_result(&self, result: &OperationRow) {
        match self.format {
            OutputFormat::Table => {
                if result.success {
                    self.success(&result.message);
                } else {
                    self.error(&result.message);
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
    }
}

/// One barring category for the query table
#[derive(Debug, Tabled, Serialize)]
pub struct CategoryRow {
    #[tabled(rename = "Direction")]
    pub direction: String,
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Code")]
    pub code: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

/// Outcome of set / cancel-all / change-password
#[derive(Debug, Serialize)]
pub struct OperationRow {
    pub operation: String,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AggregateBarringState>,
}

pub fn state_rows(state: &AggregateBarringState) -> Vec<CategoryRow> {
    SCAN_ORDER
        .iter()
        .map(|&category| CategoryRow {
            direction: category
                .direction()
                .map(|d| d.to_string())
                .unwrap_or_default(),
            category: category.short_name().to_string(),
            code: facility_code(category).to_string(),
            name: category.to_string(),
            status: status_label(state, category),
        })
        .collect()
}

fn status_label(state: &AggregateBarringState, category: BarringCategory) -> String {
    if state.is_active(category) {
        "active".green().to_string()
    } else {
        "inactive".dimmed().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_state_rows_mark_active() {
        colored::control::set_override(false);
        let mut state = AggregateBarringState::default();
        state.activate(BarringCategory::IncomingWhenRoaming);

        let rows = state_rows(&state);
        assert_eq!(rows.len(), 5);
        let active: Vec<&str> = rows
            .iter()
            .filter(|r| r.status == "active")
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(active, vec!["IR"]);
    }

    #[test]
    fn test_output_format_from_config() {
        assert_eq!(OutputFormat::from_config("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_config("yaml"), OutputFormat::Table);
        assert_eq!(OutputFormat::Json.as_str(), "json");
    }
}
