//! Asset slots and their package paths.
//!
//! A slot is one optional binary field of the Course Document. Slots order
//! themselves the way the manifest lists them: slide images by slide index,
//! scene images by scene index, the narration track, then background music.

use serde::Serialize;

use crate::course::{CourseDocument, EncodedAsset};

pub const INDEX_HTML: &str = "index.html";
pub const SCRIPT_JS: &str = "script.js";
pub const STYLES_CSS: &str = "styles.css";
pub const MANIFEST_XML: &str = "imsmanifest.xml";

/// The generated files every package lists, in manifest order.
pub const FIXED_FILES: [&str; 3] = [INDEX_HTML, SCRIPT_JS, STYLES_CSS];

pub const NARRATION_PATH: &str = "video/narration.mp3";
pub const MUSIC_PATH: &str = "video/music.mp3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetKind {
    Image,
    Audio,
}

impl AssetKind {
    /// Top-level MIME type accepted for this kind.
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            Self::Image => "image/",
            Self::Audio => "audio/",
        }
    }
}

/// Zero-based slot indices; paths are one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetSlot {
    SlideImage(usize),
    SceneImage(usize),
    Narration,
    BackgroundMusic,
}

impl AssetSlot {
    pub fn path(&self) -> String {
        match self {
            Self::SlideImage(i) => format!("images/slide_{}.png", i + 1),
            Self::SceneImage(i) => format!("video/scene_{}.png", i + 1),
            Self::Narration => NARRATION_PATH.to_string(),
            Self::BackgroundMusic => MUSIC_PATH.to_string(),
        }
    }

    pub fn kind(&self) -> AssetKind {
        match self {
            Self::SlideImage(_) | Self::SceneImage(_) => AssetKind::Image,
            Self::Narration | Self::BackgroundMusic => AssetKind::Audio,
        }
    }
}

/// Every encoded asset present in the course, in manifest order.
pub fn course_assets(course: &CourseDocument) -> Vec<(AssetSlot, &EncodedAsset)> {
    let mut assets = Vec::new();

    for (i, slide) in course.slides.iter().enumerate() {
        if let Some(image) = &slide.image_asset {
            assets.push((AssetSlot::SlideImage(i), image));
        }
    }

    if let Some(video) = &course.video {
        for (i, scene) in video.scenes.iter().enumerate() {
            if let Some(image) = &scene.image_asset {
                assets.push((AssetSlot::SceneImage(i), image));
            }
        }
        if let Some(track) = video.narration_track() {
            assets.push((AssetSlot::Narration, track));
        }
        if let Some(music) = &video.background_music_asset {
            assets.push((AssetSlot::BackgroundMusic, music));
        }
    }

    assets
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET MANIFEST
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntry {
    #[serde(skip)]
    pub slot: AssetSlot,
    pub path: String,
}

/// The set of binary files a package will contain.
///
/// Manifest, markup and archive are all derived from one `AssetManifest`, so a
/// path can only be referenced if it is also packaged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetManifest {
    entries: Vec<AssetEntry>,
}

impl AssetManifest {
    pub fn from_slots(slots: impl IntoIterator<Item = AssetSlot>) -> Self {
        let mut slots: Vec<AssetSlot> = slots.into_iter().collect();
        slots.sort();
        slots.dedup();
        Self {
            entries: slots
                .into_iter()
                .map(|slot| AssetEntry {
                    slot,
                    path: slot.path(),
                })
                .collect(),
        }
    }

    /// Manifest of every asset the course declares, before any decoding.
    pub fn from_course(course: &CourseDocument) -> Self {
        Self::from_slots(course_assets(course).into_iter().map(|(slot, _)| slot))
    }

    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path_for(&self, slot: AssetSlot) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.slot == slot)
            .map(|e| e.path.as_str())
    }

    pub fn contains(&self, slot: AssetSlot) -> bool {
        self.path_for(slot).is_some()
    }

    /// Fixed files followed by asset paths: the manifest `<file>` listing.
    pub fn package_files(&self) -> Vec<String> {
        FIXED_FILES
            .iter()
            .map(|f| f.to_string())
            .chain(self.entries.iter().map(|e| e.path.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_one_based() {
        assert_eq!(AssetSlot::SlideImage(0).path(), "images/slide_1.png");
        assert_eq!(AssetSlot::SceneImage(2).path(), "video/scene_3.png");
        assert_eq!(AssetSlot::Narration.path(), "video/narration.mp3");
    }

    #[test]
    fn test_manifest_order_is_deterministic() {
        let manifest = AssetManifest::from_slots(vec![
            AssetSlot::Narration,
            AssetSlot::SceneImage(1),
            AssetSlot::SlideImage(3),
            AssetSlot::BackgroundMusic,
            AssetSlot::SlideImage(0),
            AssetSlot::SceneImage(0),
        ]);
        let paths: Vec<&str> = manifest.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "images/slide_1.png",
                "images/slide_4.png",
                "video/scene_1.png",
                "video/scene_2.png",
                "video/narration.mp3",
                "video/music.mp3",
            ]
        );
        assert_eq!(manifest.package_files().len(), 3 + 6);
        assert_eq!(manifest.package_files()[0], INDEX_HTML);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(AssetSlot::SlideImage(0).kind(), AssetKind::Image);
        assert_eq!(AssetSlot::BackgroundMusic.kind(), AssetKind::Audio);
    }
}
