//! Editable payload buffers and their highlighted previews.

use crate::{samples, verify::typed_data_digest};
use alloy_primitives::B256;
use serde_json::Value;
use std::{fmt, str::FromStr};

/// Identifies one of the editable payload buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EditorId {
    /// Plain text for `personal_sign`.
    Message,
    TypedDataV4,
    TypedDataV3,
    TypedDataLegacy,
}

impl EditorId {
    pub const ALL: [Self; 4] =
        [Self::Message, Self::TypedDataV4, Self::TypedDataV3, Self::TypedDataLegacy];

    /// Whether the buffer holds JSON and gets a preview.
    pub fn is_json(self) -> bool {
        !matches!(self, Self::Message)
    }

    /// Whether `domain.chainId` follows the wallet's active chain.
    ///
    /// Only the EIP-712 payloads carry a domain.
    pub fn follows_chain(self) -> bool {
        matches!(self, Self::TypedDataV4 | Self::TypedDataV3)
    }

    /// The text the buffer starts with.
    pub fn default_text(self) -> String {
        match self {
            Self::Message => samples::DEFAULT_MESSAGE.to_string(),
            Self::TypedDataV4 => samples::to_editor_text(&samples::typed_data_v4()),
            Self::TypedDataV3 => samples::to_editor_text(&samples::typed_data_v3()),
            Self::TypedDataLegacy => samples::to_editor_text(&samples::typed_data_legacy()),
        }
    }
}

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Message => "message",
            Self::TypedDataV4 => "typed data v4",
            Self::TypedDataV3 => "typed data v3",
            Self::TypedDataLegacy => "legacy typed data",
        })
    }
}

impl FromStr for EditorId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "message" | "personal" | "msg" => Ok(Self::Message),
            "v4" | "typed-data-v4" => Ok(Self::TypedDataV4),
            "v3" | "typed-data-v3" => Ok(Self::TypedDataV3),
            "legacy" | "v1" | "typed-data" => Ok(Self::TypedDataLegacy),
            _ => Err(format!("unknown editor `{s}`, expected one of: message, v4, v3, legacy")),
        }
    }
}

/// The rendering of an editor's current text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Preview {
    /// Re-formatted JSON with `<span class="...">` highlight markup.
    Rendered(String),
    /// The text does not parse. Holds the message to show in place of the preview.
    Invalid(String),
}

impl Preview {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

/// Parses `text` as JSON and renders it formatted and highlighted.
///
/// Pure: the same text always yields the same preview.
pub fn render_preview(text: &str) -> Preview {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Preview::Rendered(highlight(&samples::to_editor_text(&value))),
        Err(err) => Preview::Invalid(format!("JSON parse error: {err}")),
    }
}

/// Wraps keys, strings, numbers and literals of formatted JSON in spans, escaping the rest.
pub fn highlight(formatted: &str) -> String {
    let mut out = String::with_capacity(formatted.len() * 2);
    let mut rest = formatted;
    while let Some(c) = rest.chars().next() {
        let len = match c {
            '"' => {
                let end = string_end(rest);
                let class =
                    if rest[end..].trim_start().starts_with(':') { "key" } else { "string" };
                push_span(&mut out, class, &rest[..end]);
                end
            }
            '-' | '0'..='9' => {
                let end = rest
                    .find(|c: char| !(c.is_ascii_digit() || "-+.eE".contains(c)))
                    .unwrap_or(rest.len());
                push_span(&mut out, "number", &rest[..end]);
                end
            }
            'a'..='z' => {
                let end = rest.find(|c: char| !c.is_ascii_lowercase()).unwrap_or(rest.len());
                push_span(&mut out, "literal", &rest[..end]);
                end
            }
            _ => {
                push_escaped(&mut out, c);
                c.len_utf8()
            }
        };
        rest = &rest[len..];
    }
    out
}

/// Byte offset just past the closing quote of the string literal `s` starts with.
fn string_end(s: &str) -> usize {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return i + 1;
        }
    }
    s.len()
}

fn push_span(out: &mut String, class: &str, token: &str) {
    out.push_str("<span class=\"");
    out.push_str(class);
    out.push_str("\">");
    token.chars().for_each(|c| push_escaped(out, c));
    out.push_str("</span>");
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        c => out.push(c),
    }
}

/// One editable payload buffer.
#[derive(Clone, Debug)]
pub struct Editor {
    id: EditorId,
    text: String,
    preview: Option<Preview>,
}

impl Editor {
    /// Creates an editor holding `text`.
    pub fn new(id: EditorId, text: impl Into<String>) -> Self {
        let mut editor = Self { id, text: String::new(), preview: None };
        editor.set_text(text);
        editor
    }

    /// Creates an editor holding the default sample for `id`.
    pub fn with_default(id: EditorId) -> Self {
        Self::new(id, id.default_text())
    }

    pub fn id(&self) -> EditorId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The preview of the current text, `None` for the plain message buffer.
    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Replaces the text and re-renders the preview.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.preview = self.id.is_json().then(|| render_preview(&self.text));
    }

    /// The EIP-712 hash the wallet is expected to sign, for the v3/v4 buffers.
    ///
    /// Errors are returned as text and never block signing.
    pub fn digest(&self) -> Option<Result<B256, String>> {
        self.id.follows_chain().then(|| typed_data_digest(&self.text).map_err(|e| e.to_string()))
    }

    /// Parses the current text as JSON.
    pub fn parse(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.text)
    }

    /// Rewrites `domain.chainId` to `chain_id`.
    ///
    /// Returns `false` without touching the text when the buffer does not follow the chain, does
    /// not parse, or has no `domain` object.
    pub fn sync_chain_id(&mut self, chain_id: u64) -> bool {
        if !self.id.follows_chain() {
            return false;
        }
        let Ok(mut value) = self.parse() else {
            trace!(editor = %self.id, "skipping chain id sync, payload does not parse");
            return false;
        };
        let Some(Value::Object(domain)) = value.get_mut("domain") else {
            return false;
        };
        domain.insert("chainId".to_string(), Value::from(chain_id));
        self.set_text(samples::to_editor_text(&value));
        true
    }
}
