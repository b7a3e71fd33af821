use bridge_core::{Operation, OperationResult, Record, RecordLevel, Reporter};
use colored::Colorize;

/// Prints operation records to the terminal, one line per record.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, record: Record) {
        println!("{}", format_record(&record));
    }
}

fn format_record(record: &Record) -> String {
    let mut line = match record.level {
        RecordLevel::Info => record.message.clone(),
        RecordLevel::Warn => record.message.yellow().to_string(),
    };

    for (key, value) in &record.fields {
        if key == "info" {
            continue;
        }
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        line.push_str(&format!("  {}={}", key.dimmed(), value));
    }
    line
}

/// Render the outcome of an external operation: a status line and every
/// accumulated error, warnings included.
pub fn render_result(operation: &dyn Operation, result: &OperationResult) {
    if result.success() {
        println!("{} {}", "✓".green(), operation.label());
    } else {
        println!("{} {} failed", "✗".red(), operation.label());
    }

    for error in result.errors() {
        if error.is_cancelled() {
            println!("  {} {}", "!".yellow(), error);
        } else {
            println!("  {} {}", "-".red(), error);
        }
    }
}

pub fn render_operations<'a>(operations: impl Iterator<Item = &'a dyn Operation>) {
    for operation in operations {
        println!("{:<24} {}", operation.id().bold(), operation.label());
        if !operation.description().is_empty() {
            println!("{:<24} {}", "", operation.description().dimmed());
        }
    }
}
