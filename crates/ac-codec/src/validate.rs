//! Validation structurelle et normalisation des payloads avant dispatch.
//!
//! [`validate`] never fails: it reports `{valid, reason}` so batch and stream
//! callers can skip bad entries. [`normalize`] runs the same checks, then
//! lifts the accepted envelope shapes into one [`TaggedPayload`]:
//! - `{type, data, metadata: {width|w, height|h, extra?}}`;
//! - dimensions missing from `metadata` but present in `data` (`w`/`h` or
//!   `dimensions`);
//! - a bare compact or legacy sparse frame with no envelope, read as
//!   `ultraMinimal`;
//! - the saved-image wrapper `{meta: {v, t, m}, data: <frame>}`, read as
//!   `ultraMinimal` with `meta` carried in `extra`.
//!
//! Dimensions whose area exceeds the cell limit are rejected before any
//! grid is allocated.

use ac_core::DEFAULT_MAX_CELLS;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::CodecError;
use crate::payload::{CodecTag, Metadata, TaggedPayload};

/// Raison d'un rejet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// Payload is not a JSON object.
    #[error("le payload n'est pas un objet")]
    NotAnObject,

    /// `type` absent or not a string.
    #[error("champ 'type' manquant")]
    MissingType,

    /// `data` absent or null.
    #[error("champ 'data' manquant")]
    MissingData,

    /// `type` names no known codec.
    #[error("codec inconnu : {0}")]
    UnknownCodec(String),

    /// Width or height missing or zero, or area above the cell limit.
    #[error("dimensions invalides ({width:?}×{height:?})")]
    BadDimensions {
        /// Resolved width, if any.
        width: Option<usize>,
        /// Resolved height, if any.
        height: Option<usize>,
    },

    /// Bitmap data without a usable palette.
    #[error("palette bitmap absente ou vide")]
    MissingPalette,

    /// Hybrid data without both sub-payloads.
    #[error("hybrid : champ '{0}' manquant")]
    MissingHybridField(&'static str),
}

impl From<Issue> for CodecError {
    fn from(issue: Issue) -> Self {
        match issue {
            Issue::UnknownCodec(name) => Self::UnknownCodec(name),
            Issue::BadDimensions { .. } => Self::MalformedMetadata(issue.to_string()),
            Issue::MissingPalette => Self::IncompletePalette(issue.to_string()),
            other => Self::MalformedPayload(other.to_string()),
        }
    }
}

/// Résultat structuré de [`validate`].
///
/// Serialises as `{"valid": true}` or `{"valid": false, "reason": "..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Validation {
    /// Whether the payload may be dispatched.
    pub valid: bool,
    /// Human-readable rejection reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Result<(), Issue>> for Validation {
    fn from(result: Result<(), Issue>) -> Self {
        match result {
            Ok(()) => Self {
                valid: true,
                reason: None,
            },
            Err(issue) => Self {
                valid: false,
                reason: Some(issue.to_string()),
            },
        }
    }
}

fn dimension(obj: &Map<String, Value>, long: &str, short: &str) -> Option<usize> {
    obj.get(long)
        .or_else(|| obj.get(short))
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
}

/// Dimensions from `metadata`, falling back to those carried in `data`.
fn resolve_dimensions(
    metadata: Option<&Map<String, Value>>,
    data: &Value,
) -> (Option<usize>, Option<usize>) {
    let from_meta = metadata.map_or((None, None), |m| {
        (dimension(m, "width", "w"), dimension(m, "height", "h"))
    });
    let from_data = data.as_object().map_or((None, None), |d| {
        match d.get("dimensions").and_then(Value::as_object) {
            Some(dims) => (dimension(dims, "width", "w"), dimension(dims, "height", "h")),
            None => (dimension(d, "width", "w"), dimension(d, "height", "h")),
        }
    });
    (from_meta.0.or(from_data.0), from_meta.1.or(from_data.1))
}

/// A sparse frame sent without envelope.
fn is_bare_frame(obj: &Map<String, Value>) -> bool {
    !obj.contains_key("type")
        && ((obj.contains_key("c") && obj.contains_key("w") && obj.contains_key("h"))
            || (obj.contains_key("charPositions") && obj.contains_key("dimensions")))
}

/// The frame inside a `{meta, data: <frame>}` image export.
fn wrapped_frame(obj: &Map<String, Value>) -> Option<&Value> {
    if obj.contains_key("type") {
        return None;
    }
    obj.get("data")
        .filter(|d| d.as_object().is_some_and(is_bare_frame))
}

fn has_palette(data: &Value) -> bool {
    match data.get("c").or_else(|| data.get("charset")) {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        _ => false,
    }
}

/// Checks shared by [`validate`] and [`normalize`]; yields the tag,
/// `data` and dimensions of an accepted payload.
fn check(value: &Value, max_cells: usize) -> Result<(CodecTag, &Value, usize, usize), Issue> {
    let obj = value.as_object().ok_or(Issue::NotAnObject)?;

    let (tag, data, metadata) = if is_bare_frame(obj) {
        (CodecTag::UltraMinimal, value, None)
    } else if let Some(frame) = wrapped_frame(obj) {
        (CodecTag::UltraMinimal, frame, None)
    } else {
        let name = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(Issue::MissingType)?;
        let tag = name
            .parse::<CodecTag>()
            .map_err(|_| Issue::UnknownCodec(name.to_string()))?;
        // `null` is the quad-tree of an all-blank grid.
        let data = obj
            .get("data")
            .filter(|d| !d.is_null() || tag == CodecTag::QuadTree)
            .ok_or(Issue::MissingData)?;
        (tag, data, obj.get("metadata").and_then(Value::as_object))
    };

    let (width, height) = match resolve_dimensions(metadata, data) {
        (Some(w), Some(h)) if w.checked_mul(h).is_some_and(|n| n > 0 && n <= max_cells) => {
            (w, h)
        }
        (width, height) => return Err(Issue::BadDimensions { width, height }),
    };

    match tag {
        CodecTag::Bitmap if !has_palette(data) => return Err(Issue::MissingPalette),
        CodecTag::Hybrid => {
            for (method, field) in [("method1", "data1"), ("method2", "data2")] {
                let name = data
                    .get(method)
                    .and_then(Value::as_str)
                    .ok_or(Issue::MissingHybridField(method))?;
                // Même règle que pour `data` : `null` n'est valide qu'en quadTree.
                let quadtree = name == CodecTag::QuadTree.name();
                if data.get(field).is_none_or(|d| d.is_null() && !quadtree) {
                    return Err(Issue::MissingHybridField(field));
                }
            }
        }
        _ => {}
    }
    Ok((tag, data, width, height))
}

/// Validate a raw payload without decoding it.
///
/// # Example
/// ```
/// use ac_codec::validate::validate;
/// use serde_json::json;
///
/// let ok = json!({"type": "rle", "data": [], "metadata": {"width": 2, "height": 1}});
/// assert!(validate(&ok).valid);
///
/// let bad = json!({"type": "rle", "data": [], "metadata": {"width": 0, "height": 1}});
/// let report = validate(&bad);
/// assert!(!report.valid);
/// assert!(report.reason.is_some());
/// ```
#[must_use]
pub fn validate(value: &Value) -> Validation {
    validate_with(value, DEFAULT_MAX_CELLS)
}

/// [`validate`] with an explicit cell limit.
#[must_use]
pub fn validate_with(value: &Value, max_cells: usize) -> Validation {
    Validation::from(check(value, max_cells).map(|_| ()))
}

/// Validate then lift `value` into the canonical envelope.
///
/// # Errors
/// Returns the [`CodecError`] matching the first failed check:
/// `UnknownCodec`, `MalformedMetadata`, `IncompletePalette`, or
/// `MalformedPayload`.
pub fn normalize(value: &Value) -> Result<TaggedPayload, CodecError> {
    normalize_with(value, DEFAULT_MAX_CELLS)
}

/// [`normalize`] with an explicit cell limit.
///
/// # Errors
/// See [`normalize`].
pub fn normalize_with(value: &Value, max_cells: usize) -> Result<TaggedPayload, CodecError> {
    let (tag, data, width, height) = check(value, max_cells)?;
    let extra = value
        .get("metadata")
        .and_then(|m| m.get("extra"))
        .or_else(|| value.get("meta"))
        .filter(|e| !e.is_null())
        .cloned();
    Ok(TaggedPayload {
        tag,
        data: data.clone(),
        metadata: Metadata {
            width,
            height,
            extra,
        },
    })
}
