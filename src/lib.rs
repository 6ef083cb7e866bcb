//! # SCORM Package Synthesizer
//!
//! Turns an in-memory course (slides, an optional narrated scene video and a
//! multiple-choice quiz) into a self-contained SCORM 1.2 or SCORM 2004 (4th
//! edition) ZIP package.
//!
//! ## Package Invariants
//!
//! 1. **Closed Package**: every path the markup references is listed in the
//!    manifest, and every listed path is in the archive.
//! 2. **Escaped Text**: course text reaches the markup only through the HTML
//!    escaper and the manifest only through the XML escaper.
//! 3. **One Runtime**: `script.js` is a fixed template parameterized by one
//!    typed `RuntimeConfig`. The LMS session, navigation, quiz and timeline it
//!    implements are modeled in [`lms`], [`navigation`], [`scoring`] and
//!    [`timeline`] with the same semantics.
//! 4. **Reproducible**: without a timestamp, identical input produces
//!    identical bytes.
//! 5. **Degrade, Never Break**: a missing or failing LMS leaves the course
//!    fully usable in standalone mode.

pub mod assets;
pub mod course;
pub mod finalize;
pub mod lms;
pub mod manifest;
pub mod navigation;
pub mod package;
pub mod parse;
pub mod render;
pub mod runtime;
pub mod scoring;
pub mod scorm;
pub mod timeline;
pub mod validate;

#[cfg(test)]
mod lms_tests;

#[cfg(feature = "napi")]
pub use finalize::synthesize_package_native;

pub use assets::{AssetManifest, AssetSlot};
pub use course::{
    resync_scene_durations, CourseDocument, EncodedAsset, Question, Scene, Slide, VideoContent,
};
pub use finalize::{synthesize_package, synthesize_request, PackageSummary, SynthOptions};
pub use package::ScormPackage;
pub use parse::{parse_course, parse_request, SynthesisRequest};
pub use scorm::{CompletionPolicy, ScormVersion};
pub use validate::{validate_course, CourseViolation, SynthError};
