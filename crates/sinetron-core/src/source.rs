//! Video source resolution
//!
//! Turns the raw stream payload - a heterogeneous, partially
//! base64-obfuscated multi-resolution structure - into an ordered
//! [`SourceSet`]. Resolution never fails: a payload with no usable URL
//! yields an empty, unplayable set for the caller to handle.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::types::{SourceSet, VideoSource, AUTO_RESOLUTION};

/// Key prefix of `video_list` entries whose resolution must be derived
/// from the key itself (`video_720` -> `720p`)
const VIDEO_KEY_PREFIX: &str = "video_";

/// Nested video model; arrives inline or as a JSON-encoded string
#[derive(Debug, Deserialize)]
struct VideoModel {
    #[serde(default)]
    video_list: BTreeMap<String, VideoEntry>,
    auto_definition: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoEntry {
    main_url: Option<String>,
    definition: Option<String>,
}

/// Resolve a raw stream payload into a [`SourceSet`]
pub fn resolve(payload: &Value) -> SourceSet {
    let mut set = SourceSet {
        main_url: payload
            .get("main_url")
            .and_then(Value::as_str)
            .and_then(decode_url),
        ..SourceSet::default()
    };

    if let Some(model) = video_model(payload) {
        for (key, entry) in &model.video_list {
            let Some(url) = entry.main_url.as_deref().and_then(decode_url) else {
                continue;
            };
            let resolution = match entry.definition.as_deref() {
                Some(definition) if !definition.is_empty() => definition.to_string(),
                _ => format!("{}p", key.trim_start_matches(VIDEO_KEY_PREFIX)),
            };
            set.sources.push(VideoSource {
                label: resolution.clone(),
                resolution,
                url,
            });
        }
        set.auto_definition = model.auto_definition;
    }

    // Highest tier first; non-numeric tags rank 0 and land last.
    set.sources
        .sort_by(|a, b| resolution_rank(&b.resolution).cmp(&resolution_rank(&a.resolution)));

    // A set with a main URL but no explicit tiers still gets one entry,
    // so a non-empty set is always playable.
    if set.sources.is_empty() {
        if let Some(main) = &set.main_url {
            set.sources.push(VideoSource {
                resolution: AUTO_RESOLUTION.to_string(),
                label: "Auto".to_string(),
                url: main.clone(),
            });
        }
    }

    set
}

/// Decode a possibly base64-obfuscated URL.
///
/// Absolute URLs pass through untouched; everything else gets one
/// base64 attempt, and when that fails the raw string is passed through
/// so a mislabelled source still reaches the sink. Empty input counts
/// as absent.
pub fn decode_url(encoded: &str) -> Option<String> {
    if encoded.is_empty() {
        return None;
    }
    if encoded.starts_with("http") {
        return Some(encoded.to_string());
    }
    match BASE64.decode(encoded) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(url) => Some(url),
            Err(_) => {
                debug!("decoded source URL is not UTF-8, passing raw value through");
                Some(encoded.to_string())
            }
        },
        Err(_) => {
            debug!("source URL is neither absolute nor base64, passing raw value through");
            Some(encoded.to_string())
        }
    }
}

/// Best-effort extraction of the nested video model. A string value is
/// parsed as JSON; parse failures discard the model rather than failing
/// the whole resolution.
fn video_model(payload: &Value) -> Option<VideoModel> {
    let raw = payload.get("video_model")?;
    let parsed = match raw {
        Value::String(text) => serde_json::from_str(text),
        other => serde_json::from_value(other.clone()),
    };
    match parsed {
        Ok(model) => Some(model),
        Err(err) => {
            debug!(%err, "discarding malformed video model");
            None
        }
    }
}

/// Leading integer of a resolution tag, for descending quality order
fn resolution_rank(resolution: &str) -> u32 {
    let digits: String = resolution
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}
