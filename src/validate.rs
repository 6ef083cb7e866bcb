use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::course::CourseDocument;

// ═══════════════════════════════════════════════════════════════════════════════
// VIOLATION CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const COURSE_EMPTY_TITLE: &str = "COURSE_EMPTY_TITLE";
pub const COURSE_NO_SLIDES: &str = "COURSE_NO_SLIDES";
pub const COURSE_NO_QUESTIONS: &str = "COURSE_NO_QUESTIONS";
pub const QUESTION_ALTERNATIVE_COUNT: &str = "QUESTION_ALTERNATIVE_COUNT";
pub const QUESTION_CORRECT_INDEX: &str = "QUESTION_CORRECT_INDEX";
pub const SCENE_DURATION: &str = "SCENE_DURATION";
pub const VIDEO_NO_SCENES: &str = "VIDEO_NO_SCENES";

pub const MIN_ALTERNATIVES: usize = 2;
pub const MAX_ALTERNATIVES: usize = 6;

fn get_guarantee(code: &str) -> &'static str {
    match code {
        COURSE_EMPTY_TITLE => "Every package carries a non-blank title in its manifest and markup.",
        COURSE_NO_SLIDES => "The slides section always has a first slide to show.",
        COURSE_NO_QUESTIONS => "The quiz always has a final question that finishes the session.",
        QUESTION_ALTERNATIVE_COUNT => "Every question offers between 2 and 6 alternatives.",
        QUESTION_CORRECT_INDEX => "Every question's correct index names an existing alternative.",
        SCENE_DURATION => "Every scene occupies a positive, finite span of the timeline.",
        VIDEO_NO_SCENES => "A packaged video can always be played to completion.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// One rejected property of an input Course Document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseViolation {
    pub code: String,
    /// Location inside the document, e.g. `questions[2].correctIndex`.
    pub path: String,
    pub message: String,
    pub guarantee: String,
}

impl CourseViolation {
    pub fn new(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            path: path.into(),
            message: message.into(),
            guarantee: get_guarantee(code).to_string(),
        }
    }
}

impl std::fmt::Display for CourseViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

fn summarize(violations: &[CourseViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("Invalid course document ({} violation(s)): {}", .violations.len(), summarize(.violations))]
    InvalidCourse { violations: Vec<CourseViolation> },

    #[error("Unsupported SCORM version '{0}' (expected \"1.2\" or \"2004\")")]
    UnsupportedVersion(String),

    #[error("Unsupported completion status '{0}' (expected \"completed\" or \"passed-failed\")")]
    UnsupportedCompletionPolicy(String),

    #[error("Invalid synthesis request: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    #[error("Generated runtime script is invalid: {0}")]
    Script(String),

    #[error("Package references are inconsistent: missing {missing:?}, orphaned {orphaned:?}")]
    Reference {
        missing: Vec<String>,
        orphaned: Vec<String>,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthError {
    pub fn violations(&self) -> &[CourseViolation] {
        match self {
            Self::InvalidCourse { violations } => violations,
            _ => &[],
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COURSE VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Check every structural rule of a Course Document.
///
/// All violations are collected so the editing layer can report them at once.
/// A duration/timeline mismatch is not a violation; it is only logged.
pub fn validate_course(course: &CourseDocument) -> Result<(), SynthError> {
    let mut violations = Vec::new();

    if course.title.trim().is_empty() {
        violations.push(CourseViolation::new(
            COURSE_EMPTY_TITLE,
            "title",
            "title is empty after trimming",
        ));
    }

    if course.slides.is_empty() {
        violations.push(CourseViolation::new(
            COURSE_NO_SLIDES,
            "slides",
            "at least one slide is required",
        ));
    }

    if course.questions.is_empty() {
        violations.push(CourseViolation::new(
            COURSE_NO_QUESTIONS,
            "questions",
            "at least one question is required",
        ));
    }

    for (i, q) in course.questions.iter().enumerate() {
        let count = q.alternatives.len();
        if !(MIN_ALTERNATIVES..=MAX_ALTERNATIVES).contains(&count) {
            violations.push(CourseViolation::new(
                QUESTION_ALTERNATIVE_COUNT,
                format!("questions[{}].alternatives", i),
                format!(
                    "{} alternatives given, expected {}..={}",
                    count, MIN_ALTERNATIVES, MAX_ALTERNATIVES
                ),
            ));
        }
        if q.correct_index >= count {
            violations.push(CourseViolation::new(
                QUESTION_CORRECT_INDEX,
                format!("questions[{}].correctIndex", i),
                format!("index {} out of range for {} alternatives", q.correct_index, count),
            ));
        }
    }

    if let Some(video) = &course.video {
        if video.scenes.is_empty() {
            violations.push(CourseViolation::new(
                VIDEO_NO_SCENES,
                "video.scenes",
                "a video needs at least one scene",
            ));
        }
        for (i, scene) in video.scenes.iter().enumerate() {
            if !(scene.duration.is_finite() && scene.duration > 0.0) {
                violations.push(CourseViolation::new(
                    SCENE_DURATION,
                    format!("video.scenes[{}].duration", i),
                    format!("duration {} is not a positive number of seconds", scene.duration),
                ));
            }
        }

        let sum = video.scene_duration_sum();
        if violations.is_empty() && (sum - video.total_duration).abs() > 1e-6 {
            log::warn!(
                "Video '{}' totalDuration {}s differs from scene sum {}s; playback will desync",
                video.title,
                video.total_duration,
                sum
            );
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SynthError::InvalidCourse { violations })
    }
}
