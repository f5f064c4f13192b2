/// Rendering a project's tokens as a downloadable file
///
/// Token names are slash-namespaced (`color/primary`). JSON keys use dots in
/// place of slashes (`color.primary`); stylesheet variables and Tailwind keys
/// use dashes (`color-primary`).
///
/// | Format   | Output                                             |
/// |----------|----------------------------------------------------|
/// | json     | `{"color.primary": "#FF0000"}`                     |
/// | css      | `--color-primary: #FF0000;`                        |
/// | scss     | `$color-primary: #FF0000;`                         |
/// | less     | `@color-primary: #FF0000;`                         |
/// | tailwind | `module.exports = {"theme": {"extend": {...}}};`   |
///
/// The Tailwind output only carries `color` and `spacing` tokens.

use serde_json::{json, Map, Value as JsonValue};

use crate::models::token::{Token, TokenType};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Css,
    Scss,
    Less,
    Tailwind,
}

impl ExportFormat {
    /// Parses a format name (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "css" => Some(ExportFormat::Css),
            "scss" => Some(ExportFormat::Scss),
            "less" => Some(ExportFormat::Less),
            "tailwind" => Some(ExportFormat::Tailwind),
            _ => None,
        }
    }

    /// Suggested download file name
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "design-tokens.json",
            ExportFormat::Css => "design-tokens.css",
            ExportFormat::Scss => "design-tokens.scss",
            ExportFormat::Less => "design-tokens.less",
            ExportFormat::Tailwind => "tailwind.config.js",
        }
    }

    /// HTTP content type of the rendered file
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Css => "text/css; charset=utf-8",
            ExportFormat::Tailwind => "text/javascript; charset=utf-8",
            ExportFormat::Scss | ExportFormat::Less => "text/plain; charset=utf-8",
        }
    }
}

/// Renders tokens in the given format
pub fn render(tokens: &[Token], format: ExportFormat) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Json => {
            let object: Map<String, JsonValue> = tokens
                .iter()
                .map(|t| (t.name.replace('/', "."), t.value.clone()))
                .collect();
            serde_json::to_string_pretty(&object)
        }
        ExportFormat::Css => Ok(variables(tokens, "--")),
        ExportFormat::Scss => Ok(variables(tokens, "$")),
        ExportFormat::Less => Ok(variables(tokens, "@")),
        ExportFormat::Tailwind => {
            let mut colors = Map::new();
            let mut spacing = Map::new();

            for token in tokens {
                let target = match token.token_type {
                    TokenType::Color => &mut colors,
                    TokenType::Spacing => &mut spacing,
                    _ => continue,
                };
                target.insert(variable_name(&token.name), token.value.clone());
            }

            let config = json!({
                "theme": {
                    "extend": {
                        "colors": colors,
                        "spacing": spacing,
                    }
                }
            });
            Ok(format!(
                "module.exports = {};",
                serde_json::to_string_pretty(&config)?
            ))
        }
    }
}

fn variable_name(name: &str) -> String {
    name.replace('/', "-")
}

/// Strings go out bare, everything else as JSON text
fn plain_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn variables(tokens: &[Token], prefix: &str) -> String {
    tokens
        .iter()
        .map(|t| format!("{}{}: {};", prefix, variable_name(&t.name), plain_value(&t.value)))
        .collect::<Vec<_>>()
        .join("\n")
}
