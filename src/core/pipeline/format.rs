//! Result normalization: tabular payloads rendered as Markdown or JSON.
//!
//! Rendering is deterministic. Columns follow the field order of the first
//! record, rows follow payload order, and every cell is padded to the widest
//! value of its column.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::context::InvocationContext;
use super::middleware::{Middleware, Next};
use super::request::Request;
use super::response::{Payload, Record, Response};

/// Text returned for an empty table.
pub const NO_DATA: &str = "No data available.";

/// Argument that lets a caller pick the format of one call.
pub const OUTPUT_FORMAT_ARG: &str = "output_format";

/// How successful payloads leave the pipeline.
///
/// Config, tool arguments and the format middleware all parse it through
/// [`FromStr`], so they accept the same spellings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Fixed-width Markdown table in a fenced code block.
    #[default]
    Markdown,
    /// Compact JSON array of records.
    Json,
    /// Payload left untouched, for structured transports.
    Raw,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" | "dataframe" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "raw" => Ok(Self::Raw),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for OutputFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Advertises only the client-facing formats; `raw` is for embedders.
impl JsonSchema for OutputFormat {
    fn schema_name() -> Cow<'static, str> {
        "OutputFormat".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "enum": ["markdown", "json", "dataframe"]
        })
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown => f.write_str("markdown"),
            Self::Json => f.write_str("json"),
            Self::Raw => f.write_str("raw"),
        }
    }
}

/// The result normalizer.
#[derive(Debug, Clone, Default)]
pub struct FormatMiddleware {
    default_format: OutputFormat,
}

impl FormatMiddleware {
    pub fn new(default_format: OutputFormat) -> Self {
        Self { default_format }
    }

    /// Format requested by the call itself, if any.
    fn requested_format(&self, request: &Request) -> OutputFormat {
        request
            .str_argument(OUTPUT_FORMAT_ARG)
            .and_then(|value| value.parse().ok())
            .unwrap_or(self.default_format)
    }
}

#[async_trait]
impl Middleware for FormatMiddleware {
    fn name(&self) -> &'static str {
        "format"
    }

    async fn process(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Response {
        let format = self.requested_format(ctx.request());
        match next.run(ctx).await {
            Response::Success(payload) => Response::Success(normalize(payload, format)),
            failure => failure,
        }
    }
}

/// Convert a payload to its transport-ready form.
pub fn normalize(payload: Payload, format: OutputFormat) -> Payload {
    match (payload, format) {
        (payload, OutputFormat::Raw) => payload,
        (Payload::Table(records), OutputFormat::Markdown) => Payload::Text(render_markdown(&records)),
        (Payload::Table(records), OutputFormat::Json) => Payload::Text(render_json(&records)),
        (Payload::Scalar(Value::String(text)), _) => Payload::Text(text),
        (Payload::Scalar(value), _) => Payload::Text(value.to_string()),
        (text @ Payload::Text(_), _) => text,
    }
}

/// Render records as a JSON array. Non-ASCII text is kept as is.
pub fn render_json(records: &[Record]) -> String {
    if records.is_empty() {
        return NO_DATA.to_string();
    }
    Value::Array(records.iter().cloned().map(Value::Object).collect()).to_string()
}

/// Render records as a fixed-width Markdown table in a fenced code block.
pub fn render_markdown(records: &[Record]) -> String {
    let Some(first) = records.first() else {
        return NO_DATA.to_string();
    };
    if first.is_empty() {
        return NO_DATA.to_string();
    }

    let header: Vec<String> = first.keys().map(|key| escape_cell(key)).collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            first
                .keys()
                .map(|key| record.get(key).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
                .max(3)
        })
        .collect();

    let mut out = String::from("```\n");
    push_row(&mut out, &header, &widths);
    out.push('|');
    for width in &widths {
        out.push_str(&"-".repeat(width + 2));
        out.push('|');
    }
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out.push_str("```");
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(width - cell.chars().count()));
        out.push_str(" |");
    }
    out.push('\n');
}

fn cell_text(value: &Value) -> String {
    let raw = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    escape_cell(&raw)
}

fn escape_cell(raw: &str) -> String {
    raw.replace('|', "\\|").replace(['\r', '\n'], " ")
}
