//! Locates the inline image payload inside a generation response.
//!
//! The expected location is `candidates[0].content.parts[*].inlineData`. When the response
//! shape drifts, a bounded depth-first search over the whole JSON tree takes over.

use crate::models::InlineImage;
use serde_json::Value;
use std::fmt;

pub const MAX_SEARCH_DEPTH: usize = 8;
pub const TEXT_PREVIEW_CHARS: usize = 120;

pub fn extract_image(response: &Value) -> Option<InlineImage> {
    find_direct(response).or_else(|| find_nested(response, MAX_SEARCH_DEPTH))
}

pub fn find_direct(response: &Value) -> Option<InlineImage> {
    response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?
        .iter()
        .find_map(|part| inline_data(part).and_then(as_inline_image))
}

/// Pre-order search; array items in index order, object fields in response order.
/// The root sits at depth 0 and nodes deeper than `max_depth` are never inspected.
pub fn find_nested(root: &Value, max_depth: usize) -> Option<InlineImage> {
    search(root, 0, max_depth)
}

fn search(node: &Value, depth: usize, max_depth: usize) -> Option<InlineImage> {
    if depth > max_depth {
        return None;
    }
    if let Some(image) = as_inline_image(node) {
        return Some(image);
    }
    match node {
        Value::Array(items) => items
            .iter()
            .find_map(|item| search(item, depth + 1, max_depth)),
        Value::Object(fields) => fields
            .values()
            .find_map(|child| search(child, depth + 1, max_depth)),
        _ => None,
    }
}

fn inline_data(part: &Value) -> Option<&Value> {
    part.get("inlineData").or_else(|| part.get("inline_data"))
}

fn mime_type(node: &Value) -> Option<&str> {
    node.get("mimeType")
        .or_else(|| node.get("mime_type"))
        .and_then(Value::as_str)
}

/// Matches an object carrying an `image/*` media type and string data.
fn as_inline_image(node: &Value) -> Option<InlineImage> {
    if !node.is_object() {
        return None;
    }
    let mime = mime_type(node).filter(|m| m.starts_with("image/"))?;
    let data = node.get("data")?.as_str()?;
    Some(InlineImage {
        mime_type: mime.to_string(),
        data: data.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartSummary {
    Text { preview: String, truncated: bool },
    Media { mime_type: String, data_len: usize },
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSummary {
    pub finish_reason: Option<String>,
    pub parts: Vec<PartSummary>,
}

/// What a response contained, without any raw payload bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSummary {
    pub block_reason: Option<String>,
    pub candidates: Vec<CandidateSummary>,
}

impl ResponseSummary {
    pub fn from_response(response: &Value) -> Self {
        let block_reason = response
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
            .map(str::to_string);

        let candidates = response
            .get("candidates")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(summarize_candidate).collect())
            .unwrap_or_default();

        Self {
            block_reason,
            candidates,
        }
    }
}

fn summarize_candidate(candidate: &Value) -> CandidateSummary {
    let finish_reason = candidate
        .get("finishReason")
        .and_then(Value::as_str)
        .map(str::to_string);
    let parts = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| parts.iter().map(summarize_part).collect())
        .unwrap_or_default();
    CandidateSummary {
        finish_reason,
        parts,
    }
}

fn summarize_part(part: &Value) -> PartSummary {
    if let Some(text) = part.get("text").and_then(Value::as_str) {
        let truncated = text.chars().count() > TEXT_PREVIEW_CHARS;
        return PartSummary::Text {
            preview: text.chars().take(TEXT_PREVIEW_CHARS).collect(),
            truncated,
        };
    }
    if let Some(data) = inline_data(part) {
        return PartSummary::Media {
            mime_type: mime_type(data).unwrap_or("unknown").to_string(),
            data_len: data.get("data").and_then(Value::as_str).map_or(0, str::len),
        };
    }
    PartSummary::Other
}

impl fmt::Display for ResponseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "candidates={}", self.candidates.len())?;
        if let Some(reason) = &self.block_reason {
            write!(f, " blockReason={}", reason)?;
        }
        for (i, candidate) in self.candidates.iter().enumerate() {
            write!(f, "\n  candidate[{}]: parts={}", i, candidate.parts.len())?;
            if let Some(reason) = &candidate.finish_reason {
                write!(f, " finishReason={}", reason)?;
            }
            for (j, part) in candidate.parts.iter().enumerate() {
                match part {
                    PartSummary::Text { preview, truncated } => write!(
                        f,
                        "\n    part[{}] text: {:?}{}",
                        j,
                        preview,
                        if *truncated { "..." } else { "" }
                    )?,
                    PartSummary::Media {
                        mime_type,
                        data_len,
                    } => write!(
                        f,
                        "\n    part[{}] inlineData: mimeType={} dataLength={}",
                        j, mime_type, data_len
                    )?,
                    PartSummary::Other => write!(f, "\n    part[{}] (unrecognized)", j)?,
                }
            }
        }
        Ok(())
    }
}
