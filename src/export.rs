//! Export functionality for search results.
//!
//! Provides conversion of a [`MatchResult`] to various output formats:
//! - Markdown - a heading and metadata table per candidate
//! - JSON - structured data for programmatic use
//! - Plain Text - simple, copy-paste friendly format

use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::model::types::{MatchResult, RankedMatch};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// Markdown format with headers and tables
    #[default]
    Markdown,
    /// JSON format for programmatic consumption
    Json,
    /// Plain text format for simple copy-paste
    #[value(name = "text")]
    PlainText,
}

impl ExportFormat {
    /// Get the display name for this format
    pub fn name(self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
            Self::Json => "JSON",
            Self::PlainText => "Plain Text",
        }
    }

    /// Get the file extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
            Self::PlainText => "txt",
        }
    }

    /// Give `path` this format's extension unless it already has one.
    pub fn output_path(self, path: &Path) -> PathBuf {
        if path.extension().is_some() {
            path.to_path_buf()
        } else {
            path.with_extension(self.extension())
        }
    }
}

/// Options for export customization
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Include score in output
    pub include_score: bool,
    /// Include the skills that matched
    pub include_skills: bool,
    /// Maximum skills listed per candidate (0 = unlimited)
    pub max_skills: usize,
    /// Stamp the export time into the header
    pub include_timestamp: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_score: true,
            include_skills: true,
            max_skills: 10,
            include_timestamp: true,
        }
    }
}

/// Export a result set to the specified format
pub fn export_results(
    result: &MatchResult,
    format: ExportFormat,
    options: &ExportOptions,
) -> String {
    match format {
        ExportFormat::Markdown => export_markdown(result, options),
        ExportFormat::Json => export_json(result, options),
        ExportFormat::PlainText => export_plain_text(result, options),
    }
}

/// Escape special Markdown characters to prevent formatting issues or injection.
fn escape_markdown(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('*', "\\*")
        .replace('_', "\\_")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace('<', "\\<")
        .replace('>', "\\>")
        .replace('`', "\\`")
}

fn listed_skills(m: &RankedMatch, options: &ExportOptions) -> Vec<String> {
    let limit = if options.max_skills == 0 {
        usize::MAX
    } else {
        options.max_skills
    };
    let mut skills: Vec<String> = m.matched_skills.iter().take(limit).cloned().collect();
    if m.matched_skills.len() > limit {
        skills.push(format!("+{} more", m.matched_skills.len() - limit));
    }
    skills
}

/// Export to Markdown format
fn export_markdown(result: &MatchResult, options: &ExportOptions) -> String {
    let mut output = String::new();

    output.push_str("# Search Results\n\n");
    output.push_str(&format!(
        "**Query:** `{}`\n\n",
        result.query.replace('`', "")
    ));

    if options.include_timestamp {
        output.push_str(&format!(
            "**Results:** {} | **Exported:** {}\n\n",
            result.matches.len(),
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
    } else {
        output.push_str(&format!("**Results:** {}\n\n", result.matches.len()));
    }

    if let Some(suggestion) = &result.suggestion {
        output.push_str(&format!(
            "> Did you mean **{}**? ({:.0}% match)\n\n",
            escape_markdown(&suggestion.term),
            suggestion.confidence * 100.0
        ));
    }

    output.push_str("---\n\n");

    for (i, m) in result.matches.iter().enumerate() {
        let safe_title = escape_markdown(m.candidate.title());
        output.push_str(&format!("## {}. {}\n\n", i + 1, safe_title));

        output.push_str("| Field | Value |\n");
        output.push_str("|-------|-------|\n");
        output.push_str(&format!(
            "| Id | `{}` |\n",
            m.candidate.id.as_str().replace('`', "")
        ));
        output.push_str(&format!("| Match | {} |\n", m.kind));

        if options.include_score {
            output.push_str(&format!("| Score | {:.2} |\n", m.score));
        }

        if options.include_skills {
            let skills: Vec<String> = listed_skills(m, options)
                .iter()
                .map(|s| escape_markdown(s))
                .collect();
            output.push_str(&format!("| Skills | {} |\n", skills.join(", ")));
        }

        output.push_str("\n---\n\n");
    }

    output
}

/// Export to JSON format
fn export_json(result: &MatchResult, options: &ExportOptions) -> String {
    let mut export_data = serde_json::json!({
        "query": result.query,
        "count": result.matches.len(),
        "suggestion": result.suggestion,
        "matches": result.matches.iter().map(|m| {
            let mut obj = serde_json::json!({
                "id": m.candidate.id,
                "title": m.candidate.title(),
                "kind": m.kind,
            });

            if options.include_score {
                obj["score"] = serde_json::json!(m.score);
            }

            if options.include_skills {
                obj["matched_skills"] = serde_json::json!(listed_skills(m, options));
            }

            obj
        }).collect::<Vec<_>>()
    });

    if options.include_timestamp {
        export_data["exported_at"] = serde_json::json!(Utc::now().to_rfc3339());
    }

    serde_json::to_string_pretty(&export_data).unwrap_or_else(|_| "{}".to_string())
}

/// Export to plain text format
fn export_plain_text(result: &MatchResult, options: &ExportOptions) -> String {
    let mut output = String::new();

    output.push_str("SEARCH RESULTS\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');

    output.push_str(&format!("Query: {}\n", result.query));

    if options.include_timestamp {
        output.push_str(&format!(
            "Results: {} | Exported: {}\n",
            result.matches.len(),
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
    } else {
        output.push_str(&format!("Results: {}\n", result.matches.len()));
    }

    if let Some(suggestion) = &result.suggestion {
        output.push_str(&format!(
            "Did you mean: {} ({:.0}% match)\n",
            suggestion.term,
            suggestion.confidence * 100.0
        ));
    }

    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    for (i, m) in result.matches.iter().enumerate() {
        output.push_str(&format!("[{}] {}\n", i + 1, m.candidate.title()));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        output.push_str(&format!("Id: {}\n", m.candidate.id));
        output.push_str(&format!("Match: {}\n", m.kind));

        if options.include_score {
            output.push_str(&format!("Score: {:.2}\n", m.score));
        }

        if options.include_skills {
            output.push_str(&format!(
                "Skills: {}\n",
                listed_skills(m, options).join(", ")
            ));
        }

        output.push('\n');
    }

    output
}
