//! Simple Output and Reporting
//!
//! Renders command results for stdout in human-readable or JSON form.

use crate::cli::OutputFormat;
use crate::converter::CanonicalDocument;
use crate::service::DocumentEntry;

pub struct Output {
    format: OutputFormat,
    show_colors: bool,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            show_colors: format == OutputFormat::Human && atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(format: OutputFormat, show_colors: bool) -> Self {
        Self {
            format,
            show_colors,
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Confirmation line for upload, replace and delete
    pub fn format_action(&self, action: &str, filename: &str) -> serde_json::Result<String> {
        match self.format {
            OutputFormat::Human => Ok(format!("{} {}", self.colorize(action, "32"), filename)),
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "action": action.to_lowercase(),
                "fileName": filename,
            })),
        }
    }

    pub fn format_document(&self, document: &CanonicalDocument) -> serde_json::Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.document_lines(document)),
            OutputFormat::Json => serde_json::to_string_pretty(document),
        }
    }

    pub fn format_entries(&self, entries: &[DocumentEntry]) -> serde_json::Result<String> {
        if self.format == OutputFormat::Json {
            return serde_json::to_string_pretty(entries);
        }

        let mut output = String::new();
        for entry in entries {
            output.push_str(&self.colorize(&entry.file_name, "1"));
            output.push('\n');
            output.push_str(&self.document_lines(&entry.content));
            output.push_str("\n\n");
        }

        let noun = if entries.len() == 1 {
            "document"
        } else {
            "documents"
        };
        output.push_str(&format!("{} {} found", entries.len(), noun));
        Ok(output)
    }

    fn document_lines(&self, document: &CanonicalDocument) -> String {
        format!(
            "  customerId:   {}\n  customerName: {}\n  payload:      {}",
            document.customer_id, document.customer_name, document.payload
        )
    }
}
