//! # Course Document Model
//!
//! The in-memory course handed to the synthesizer by the editing layer.
//!
//! ## Key Invariants
//!
//! 1. **Immutable Input**: the synthesizer only ever borrows a `CourseDocument`.
//! 2. **Self-Describing Assets**: binary media travel as `EncodedAsset` transport
//!    strings (`data:<mime>;base64,<payload>`) and are decoded only by the
//!    package assembler.
//! 3. **Absent Means Absent**: `null`, a missing field and an empty string all
//!    deserialize to `None`.
//! 4. **Timeline Trust**: `total_duration` is not reconciled with the scene
//!    durations here. See [`VideoContent::scene_duration_sum`].

use serde::{Deserialize, Deserializer, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// ENCODED ASSETS
// ═══════════════════════════════════════════════════════════════════════════════

/// A binary asset in its transport encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedAsset(String);

impl EncodedAsset {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Wrap raw bytes as a `data:` URL with the given MIME type.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        Self(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn non_empty_asset<'de, D>(deserializer: D) -> Result<Option<EncodedAsset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(EncodedAsset::new))
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDocument {
    pub title: String,
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub video: Option<VideoContent>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub title: String,
    /// Free text; newlines are significant and become line breaks.
    pub content: String,
    #[serde(
        default,
        alias = "imageBase64",
        deserialize_with = "non_empty_asset",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_asset: Option<EncodedAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContent {
    pub title: String,
    pub scenes: Vec<Scene>,
    /// Seconds. Should equal the sum of scene durations.
    pub total_duration: f64,
    #[serde(
        default,
        alias = "audioBase64",
        deserialize_with = "non_empty_asset",
        skip_serializing_if = "Option::is_none"
    )]
    pub narration_audio_asset: Option<EncodedAsset>,
    #[serde(
        default,
        alias = "musicBase64",
        deserialize_with = "non_empty_asset",
        skip_serializing_if = "Option::is_none"
    )]
    pub background_music_asset: Option<EncodedAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub narration: String,
    /// Seconds, strictly positive.
    pub duration: f64,
    #[serde(
        default,
        alias = "imageBase64",
        deserialize_with = "non_empty_asset",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_asset: Option<EncodedAsset>,
    /// Legacy single-audio mode: a shared narration track carried by a scene.
    #[serde(
        default,
        alias = "audioBase64",
        deserialize_with = "non_empty_asset",
        skip_serializing_if = "Option::is_none"
    )]
    pub audio_asset: Option<EncodedAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,
    pub alternatives: Vec<String>,
    pub correct_index: usize,
}

impl CourseDocument {
    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }
}

impl VideoContent {
    pub fn scene_duration_sum(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration).sum()
    }

    /// The narration track for the whole video.
    ///
    /// The unified track wins; otherwise the first scene carrying a legacy
    /// per-scene track supplies it.
    pub fn narration_track(&self) -> Option<&EncodedAsset> {
        self.narration_audio_asset
            .as_ref()
            .or_else(|| self.scenes.iter().find_map(|s| s.audio_asset.as_ref()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DURATION RESYNCHRONIZATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Rescale scene durations to a narration track of `audio_seconds`.
///
/// Each scene but the last gets a share proportional to its narration length.
/// The last scene absorbs the remainder (never less than one second), so the
/// durations sum to `total_duration` whenever the remainder is at least one.
pub fn resync_scene_durations(video: &mut VideoContent, audio_seconds: f64) {
    if !(audio_seconds.is_finite() && audio_seconds > 0.0) || video.scenes.is_empty() {
        return;
    }

    let script = video
        .scenes
        .iter()
        .map(|s| s.narration.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let total_chars = script.chars().count();

    video.total_duration = audio_seconds;

    let last = video.scenes.len() - 1;
    let mut accumulated = 0.0;
    for (index, scene) in video.scenes.iter_mut().enumerate() {
        if index == last {
            scene.duration = (audio_seconds - accumulated).max(1.0);
        } else {
            let proportion = if total_chars == 0 {
                0.0
            } else {
                scene.narration.chars().count() as f64 / total_chars as f64
            };
            scene.duration = proportion * audio_seconds;
            accumulated += scene.duration;
        }
    }
}
