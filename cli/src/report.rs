//! Serializable views of resolution and parse results.

use argtree_core::{Context, Resolution, command_path};
use serde::Serialize;

use crate::CliOutputFormat;

#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub command: String,
    pub residual: Vec<String>,
}

impl ResolveReport {
    pub fn new(resolution: &Resolution<'_>) -> Self {
        Self {
            command: command_path(resolution.path()),
            residual: resolution.residual().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FlagReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: String,
    pub persistent: bool,
}

#[derive(Debug, Serialize)]
pub struct ParseReport {
    pub command: String,
    pub args: Vec<String>,
    pub flags: Vec<FlagReport>,
}

impl ParseReport {
    pub fn new(ctx: &Context<'_>) -> Self {
        let mut flags: Vec<FlagReport> = ctx
            .flags()
            .map(|flag| FlagReport {
                name: flag.name().to_string(),
                short: flag.short(),
                type_name: flag.type_name().to_string(),
                value: flag.value_string(),
                persistent: flag.is_persistent(),
            })
            .collect();
        flags.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            command: command_path(ctx.path()),
            args: ctx.args().to_vec(),
            flags,
        }
    }
}

/// Serializes a report in the requested output format.
pub fn format_report<T: Serialize>(report: &T, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}
