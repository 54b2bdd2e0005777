//! Incident message templates.
//!
//! Templates use `{{ .Field }}` placeholders (the leading dot and the
//! surrounding whitespace are optional). Fields missing from the render
//! context expand to an empty string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

/// Values available to a template while rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// A subject/message template pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl MessageTemplate {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Check both parts for placeholder syntax errors.
    pub fn compile(&self) -> Result<(), TemplateError> {
        parse(&self.subject)?;
        parse(&self.message)?;
        Ok(())
    }

    /// Render `(subject, message)` against a context.
    pub fn render(&self, ctx: &TemplateContext) -> (String, String) {
        (render_text(&self.subject, ctx), render_text(&self.message, ctx))
    }

    pub fn default_investigating() -> Self {
        Self::new(
            "{{ .Name }} - {{ .Target }} is down",
            "{{ .Name }} check **failed** (type: {{ .Type }}) - {{ .Now }}\n\n{{ .FailReason }}",
        )
    }

    pub fn default_fixed() -> Self {
        Self::new(
            "{{ .Name }} - {{ .Target }} is back up",
            "**Resolved** - {{ .Now }}\n\nIncident #{{ .IncidentId }} closed.",
        )
    }
}

/// The two templates a monitor renders incidents with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTemplates {
    #[serde(default = "MessageTemplate::default_investigating")]
    pub investigating: MessageTemplate,
    #[serde(default = "MessageTemplate::default_fixed")]
    pub fixed: MessageTemplate,
}

impl Default for MonitorTemplates {
    fn default() -> Self {
        Self {
            investigating: MessageTemplate::default_investigating(),
            fixed: MessageTemplate::default_fixed(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Field(&'a str),
}

fn parse(text: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = text;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        let literal = &rest[..open];
        if let Some(close) = literal.find("}}") {
            return Err(TemplateError::UnexpectedClose(offset + close));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or(TemplateError::Unclosed(offset + open))?;
        let inner = &after[..close];
        segments.push(Segment::Field(field_name(inner)?));

        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    if let Some(close) = rest.find("}}") {
        return Err(TemplateError::UnexpectedClose(offset + close));
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

fn field_name(inner: &str) -> Result<&str, TemplateError> {
    let trimmed = inner.trim();
    let name = trimmed.strip_prefix('.').unwrap_or(trimmed);
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(name)
    } else {
        Err(TemplateError::InvalidPlaceholder(inner.to_string()))
    }
}

fn render_text(text: &str, ctx: &TemplateContext) -> String {
    // Templates are compiled at validation time; anything that slipped
    // through is emitted verbatim.
    let Ok(segments) = parse(text) else {
        return text.to_string();
    };

    let mut out = String::with_capacity(text.len());
    for segment in segments {
        match segment {
            Segment::Literal(s) => out.push_str(s),
            Segment::Field(name) => out.push_str(ctx.get(name).unwrap_or_default()),
        }
    }
    out
}
