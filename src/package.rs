//! Package Assembler
//!
//! Decodes binary assets and writes the final ZIP archive.
//!
//! ## Key Invariants
//!
//! 1. **Drop, Don't Fail**: an asset that does not decode is logged and left
//!    out. Its slot disappears from the [`AssetManifest`] built afterwards, so
//!    nothing references it.
//! 2. **Flat Layout**: `imsmanifest.xml` sits at the archive root next to the
//!    launch page.
//! 3. **Reproducible Bytes**: entries are written in a fixed order with fixed
//!    timestamps. Text is deflated; media is stored as-is.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::assets::{
    course_assets, AssetManifest, AssetSlot, INDEX_HTML, MANIFEST_XML, SCRIPT_JS,
    STYLES_CSS,
};
use crate::course::{CourseDocument, EncodedAsset};
use crate::validate::SynthError;

lazy_static! {
    static ref DATA_URL_PREFIX: Regex =
        Regex::new(r"^data:([A-Za-z0-9.+\-]+/[A-Za-z0-9.+\-]+)?((?:;[^;,]*)*?);base64,").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET DECODING
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetDecodeError {
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
    #[error("payload is empty")]
    Empty,
    #[error("declared type {found} is not {expected}*")]
    KindMismatch {
        expected: &'static str,
        found: String,
    },
}

#[derive(Debug, Clone)]
pub struct DecodedAsset {
    pub slot: AssetSlot,
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Decode one transport string: a `data:` URL or bare base64.
pub fn decode_asset(slot: AssetSlot, asset: &EncodedAsset) -> Result<DecodedAsset, AssetDecodeError> {
    let raw = asset.as_str().trim();

    let payload = match DATA_URL_PREFIX.captures(raw) {
        Some(caps) => {
            if let Some(mime) = caps.get(1) {
                let expected = slot.kind().mime_prefix();
                let declared = mime.as_str().to_ascii_lowercase();
                if !declared.starts_with(expected) && declared != "application/octet-stream" {
                    return Err(AssetDecodeError::KindMismatch {
                        expected,
                        found: declared,
                    });
                }
            }
            &raw[caps.get(0).map_or(0, |m| m.end())..]
        }
        None => raw,
    };

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(AssetDecodeError::Empty);
    }

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AssetDecodeError::InvalidBase64(e.to_string()))?;
    if bytes.is_empty() {
        return Err(AssetDecodeError::Empty);
    }

    Ok(DecodedAsset {
        slot,
        path: slot.path(),
        bytes,
    })
}

/// Decode every asset of the course in parallel, in manifest order.
pub fn decode_assets(course: &CourseDocument) -> Vec<DecodedAsset> {
    course_assets(course)
        .par_iter()
        .filter_map(|(slot, asset)| match decode_asset(*slot, asset) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                log::warn!("[SCORM] dropping asset {}: {}", slot.path(), e);
                None
            }
        })
        .collect()
}

/// Manifest of the assets that actually decoded.
pub fn asset_manifest(decoded: &[DecodedAsset]) -> AssetManifest {
    AssetManifest::from_slots(decoded.iter().map(|a| a.slot))
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARCHIVE
// ═══════════════════════════════════════════════════════════════════════════════

/// The generated text files of a package.
#[derive(Debug, Clone)]
pub struct PackageParts {
    pub manifest: String,
    pub markup: String,
    pub script: String,
    pub styles: String,
}

fn text_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

fn media_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default())
}

pub fn assemble(parts: &PackageParts, assets: &[DecodedAsset]) -> Result<Vec<u8>, SynthError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    let text_files = [
        (MANIFEST_XML, &parts.manifest),
        (INDEX_HTML, &parts.markup),
        (SCRIPT_JS, &parts.script),
        (STYLES_CSS, &parts.styles),
    ];
    for (name, content) in text_files {
        zip.start_file(name, text_options())?;
        zip.write_all(content.as_bytes())?;
    }

    for asset in assets {
        zip.start_file(asset.path.as_str(), media_options())?;
        zip.write_all(&asset.bytes)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

/// A finished SCORM package.
#[derive(Debug, Clone)]
pub struct ScormPackage {
    pub identifier: String,
    /// Archive entry names, in write order.
    pub files: Vec<String>,
    pub bytes: Vec<u8>,
}

impl ScormPackage {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:application/zip;base64,...` for direct download links.
    pub fn to_data_url(&self) -> String {
        format!("data:application/zip;base64,{}", self.to_base64())
    }
}
