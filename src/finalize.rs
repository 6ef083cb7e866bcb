//! Synthesis pipeline.
//!
//! `validate → decode assets → manifest / markup / script / styles →
//! syntax gate → assemble → verify`. Every stage is a pure function of the
//! course and [`SynthOptions`]; only the optional timestamp makes two runs
//! differ.
//!
//! ## Key Invariants
//!
//! 1. **One Asset Manifest**: manifest, markup and archive are all derived from
//!    the assets that decoded, never from the raw course.
//! 2. **Closed Package**: markup references ⊆ manifest files = archive entries
//!    minus `imsmanifest.xml`. Checked on the finished bytes.
//! 3. **Input Untouched**: the course is only borrowed.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Cursor;

use crate::assets::MANIFEST_XML;
use crate::course::CourseDocument;
use crate::manifest::{build_manifest, manifest_files, package_identifier};
use crate::package::{
    asset_manifest, assemble, decode_assets, PackageParts, ScormPackage,
};
use crate::parse::{collect_markup_references, SynthesisRequest};
use crate::render::{render_markup, render_styles};
use crate::runtime::{check_script_syntax, generate_runtime_script, RuntimeConfig, REQUIRED_ENTRY_POINTS};
use crate::scorm::{CompletionPolicy, ScormVersion};
use crate::validate::{validate_course, SynthError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthOptions {
    #[serde(default)]
    pub scorm_version: ScormVersion,
    #[serde(default)]
    pub completion_status: CompletionPolicy,
    /// Appended to the package identifier. `None` keeps output reproducible.
    #[serde(default)]
    pub timestamp: Option<u64>,
}

impl SynthOptions {
    pub fn from_request(request: &SynthesisRequest) -> Self {
        Self {
            scorm_version: request.scorm_version,
            completion_status: request.completion_status,
            timestamp: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

pub fn synthesize_package(
    course: &CourseDocument,
    options: &SynthOptions,
) -> Result<ScormPackage, SynthError> {
    validate_course(course)?;

    let identifier = package_identifier(&course.title, options.timestamp);
    log::info!(
        "[SCORM] synthesizing {} (SCORM {}, {})",
        identifier,
        options.scorm_version,
        options.completion_status
    );

    let decoded = decode_assets(course);
    let assets = asset_manifest(&decoded);
    log::debug!("[SCORM] {} asset(s) decoded", assets.len());

    let dialect = options.scorm_version.dialect();
    let config = RuntimeConfig::new(course, options.scorm_version, options.completion_status);
    let script = generate_runtime_script(&config)?;
    check_script_syntax(&script, REQUIRED_ENTRY_POINTS)?;

    let parts = PackageParts {
        manifest: build_manifest(&course.title, &identifier, dialect, &assets),
        markup: render_markup(course, &assets),
        script,
        styles: render_styles(),
    };

    let bytes = assemble(&parts, &decoded)?;
    let files = verify_package(&parts, &bytes)?;
    for file in &files {
        log::debug!("[SCORM] packaged {}", file);
    }

    log::info!(
        "[SCORM] package {} ready: {} file(s), {} bytes",
        identifier,
        files.len(),
        bytes.len()
    );
    Ok(ScormPackage {
        identifier,
        files,
        bytes,
    })
}

pub fn synthesize_request(
    request: &SynthesisRequest,
    timestamp: Option<u64>,
) -> Result<ScormPackage, SynthError> {
    let options = SynthOptions {
        timestamp,
        ..SynthOptions::from_request(request)
    };
    synthesize_package(&request.course, &options)
}

// ═══════════════════════════════════════════════════════════════════════════════
// VERIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Entry names of a ZIP archive, in archive order.
pub fn archive_entries(bytes: &[u8]) -> Result<Vec<String>, SynthError> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Check the finished archive against its manifest and markup.
///
/// Returns the archive entry names on success.
pub fn verify_package(parts: &PackageParts, bytes: &[u8]) -> Result<Vec<String>, SynthError> {
    let entries = archive_entries(bytes)?;
    let in_archive: BTreeSet<&str> = entries.iter().map(String::as_str).collect();
    let listed: BTreeSet<String> = manifest_files(&parts.manifest).into_iter().collect();
    let referenced = collect_markup_references(&parts.markup)?;

    let mut missing: Vec<String> = referenced
        .iter()
        .filter(|r| !listed.contains(*r))
        .cloned()
        .collect();
    missing.extend(
        listed
            .iter()
            .filter(|f| !in_archive.contains(f.as_str()))
            .cloned(),
    );

    let orphaned: Vec<String> = entries
        .iter()
        .filter(|e| e.as_str() != MANIFEST_XML && !listed.contains(*e))
        .cloned()
        .collect();

    if !missing.is_empty() || !orphaned.is_empty() {
        return Err(SynthError::Reference { missing, orphaned });
    }
    Ok(entries)
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE BINDING
// ═══════════════════════════════════════════════════════════════════════════════

/// The JSON shape the editing layer expects back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary {
    /// Base64-encoded archive.
    pub zip: String,
    pub identifier: String,
    pub files: Vec<String>,
}

impl From<&ScormPackage> for PackageSummary {
    fn from(package: &ScormPackage) -> Self {
        Self {
            zip: package.to_base64(),
            identifier: package.identifier.clone(),
            files: package.files.clone(),
        }
    }
}

#[cfg(feature = "napi")]
#[napi]
pub fn synthesize_package_native(
    request: serde_json::Value,
    timestamp: Option<i64>,
) -> napi::Result<PackageSummary> {
    let request = crate::parse::parse_request(&request.to_string())
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    let timestamp = timestamp.and_then(|t| u64::try_from(t).ok());
    let package = synthesize_request(&request, timestamp)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    Ok(PackageSummary::from(&package))
}
