//! Input parsing and emitted-markup inspection.
//!
//! Requests arrive as JSON from the editing layer. Emitted markup is read back
//! with html5ever to find every package path it references.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use serde::Deserialize;
use std::collections::BTreeSet;

use crate::course::CourseDocument;
use crate::scorm::{CompletionPolicy, ScormVersion};
use crate::validate::SynthError;

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTHESIS REQUEST
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub course: CourseDocument,
    pub scorm_version: ScormVersion,
    pub completion_status: CompletionPolicy,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    course: CourseDocument,
    #[serde(default)]
    scorm_version: Option<String>,
    #[serde(default)]
    completion_status: Option<String>,
}

/// Parse a `{ course, scormVersion, completionStatus }` request.
///
/// Version and policy default to `"1.2"` and `"completed"`; any other value is
/// rejected with its own error rather than a generic JSON one.
pub fn parse_request(json: &str) -> Result<SynthesisRequest, SynthError> {
    let raw: RawRequest = serde_json::from_str(json)?;

    let scorm_version = match raw.scorm_version {
        Some(v) => v.parse()?,
        None => ScormVersion::default(),
    };
    let completion_status = match raw.completion_status {
        Some(p) => p.parse()?,
        None => CompletionPolicy::default(),
    };

    Ok(SynthesisRequest {
        course: raw.course,
        scorm_version,
        completion_status,
    })
}

pub fn parse_course(json: &str) -> Result<CourseDocument, SynthError> {
    Ok(serde_json::from_str(json)?)
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP REFERENCES
// ═══════════════════════════════════════════════════════════════════════════════

const TIMELINE_ASSIGNMENT: &str = "window.sceneTimeline =";

fn is_package_path(url: &str) -> bool {
    let url = url.trim();
    !(url.is_empty()
        || url.starts_with('#')
        || url.starts_with("data:")
        || url.starts_with("http:")
        || url.starts_with("https:")
        || url.starts_with("//"))
}

/// Scene image paths inside an embedded `window.sceneTimeline = {...};`.
fn timeline_references(script: &str, refs: &mut BTreeSet<String>) {
    let Some(start) = script.find(TIMELINE_ASSIGNMENT) else {
        return;
    };
    let body = script[start + TIMELINE_ASSIGNMENT.len()..].trim();
    let body = body.strip_suffix(';').unwrap_or(body);

    let Ok(timeline) = serde_json::from_str::<serde_json::Value>(body) else {
        log::warn!("[SCORM] embedded scene timeline is not valid JSON");
        return;
    };
    if let Some(scenes) = timeline.get("scenes").and_then(|s| s.as_array()) {
        for image in scenes.iter().filter_map(|s| s.get("image")?.as_str()) {
            if is_package_path(image) {
                refs.insert(image.to_string());
            }
        }
    }
}

fn collect_node(handle: &Handle, refs: &mut BTreeSet<String>) {
    if let NodeData::Element { name, attrs, .. } = &handle.data {
        let tag = name.local.to_string();
        let wanted = match tag.as_str() {
            "img" | "audio" | "video" | "source" | "script" => Some("src"),
            "link" => Some("href"),
            _ => None,
        };
        let mut has_src = false;
        if let Some(wanted) = wanted {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == wanted {
                    has_src = true;
                    let value = attr.value.to_string();
                    if is_package_path(&value) {
                        refs.insert(value.trim().to_string());
                    }
                }
            }
        }

        if tag == "script" && !has_src {
            let mut text = String::new();
            for child in handle.children.borrow().iter() {
                if let NodeData::Text { contents } = &child.data {
                    text.push_str(&contents.borrow());
                }
            }
            timeline_references(&text, refs);
        }
    }

    for child in handle.children.borrow().iter() {
        collect_node(child, refs);
    }
}

/// Every package-relative path referenced by `html`.
///
/// Covers `src`/`href` attributes and scene images of an embedded timeline.
/// External URLs and `data:` URLs are ignored.
pub fn collect_markup_references(html: &str) -> Result<BTreeSet<String>, SynthError> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())?;

    let mut refs = BTreeSet::new();
    collect_node(&dom.document, &mut refs);
    Ok(refs)
}
