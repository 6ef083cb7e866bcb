//! Runtime script generation.
//!
//! `script.js` is a fixed template. Everything that varies per course or per
//! SCORM edition travels in one typed [`RuntimeConfig`], serialized as JSON and
//! substituted for [`CONFIG_PLACEHOLDER`]. No script text is spliced from
//! course content.
//!
//! ## Key Invariants
//!
//! 1. **Single Injection Point**: the template contains the placeholder exactly
//!    once and nothing else is templated.
//! 2. **Shared Constants**: the passing threshold, tick quantum, music volume
//!    and discovery cap come from the Rust modules that model the same
//!    behavior, so the two cannot disagree.
//! 3. **Syntax Gate**: emitted script must parse and declare its entry points
//!    before it is packaged.

use oxc_allocator::Allocator;
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::Serialize;
use std::collections::HashSet;

use crate::course::CourseDocument;
use crate::lms::MAX_DISCOVERY_HOPS;
use crate::scorm::{CompletionPolicy, DataWrite, LmsCalls, ScorePaths, ScormVersion};
use crate::scoring::passing_correct_answers;
use crate::timeline::TICK_MS;
use crate::validate::SynthError;

const TEMPLATE: &str = include_str!("templates/runtime.js");

pub const CONFIG_PLACEHOLDER: &str = "/*@RUNTIME_CONFIG@*/null";

/// Background music plays under the narration at this volume.
pub const MUSIC_VOLUME: f64 = 0.15;

/// Functions the runtime must declare for the package to work.
pub const REQUIRED_ENTRY_POINTS: &[&str] = &[
    "createState",
    "discoverApi",
    "initializeSession",
    "finishSession",
    "commitOnUnload",
    "showSection",
    "handleNext",
    "handlePrev",
    "checkAnswer",
    "tick",
];

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub global: &'static str,
    pub calls: LmsCalls,
}

/// Status writes per quiz outcome, chosen at finish time.
#[derive(Debug, Clone, Serialize)]
pub struct FinishWrites {
    pub passed: Vec<DataWrite>,
    pub failed: Vec<DataWrite>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeLabels {
    pub play: &'static str,
    pub pause: &'static str,
    pub watched: &'static str,
    pub scene: &'static str,
    pub correct: &'static str,
    pub try_again: &'static str,
    pub score: &'static str,
    pub watch_video_first: &'static str,
}

impl Default for RuntimeLabels {
    fn default() -> Self {
        Self {
            play: "\u{25B6} Play",
            pause: "\u{23F8} Pause",
            watched: "\u{2713} Watched",
            scene: "Scene",
            correct: "\u{2713} Correct!",
            try_again: "\u{2717} Try again",
            score: "Score",
            watch_video_first: "Watch the video first to unlock the quiz.",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub scorm_version: ScormVersion,
    pub completion_status: CompletionPolicy,
    pub api: ApiConfig,
    pub start_writes: Vec<DataWrite>,
    pub finish_writes: FinishWrites,
    pub score_paths: ScorePaths,
    pub total_slides: usize,
    pub total_questions: usize,
    pub has_video: bool,
    pub passing_correct_answers: usize,
    pub tick_ms: u64,
    pub music_volume: f64,
    pub max_discovery_hops: usize,
    pub labels: RuntimeLabels,
}

impl RuntimeConfig {
    pub fn new(course: &CourseDocument, version: ScormVersion, policy: CompletionPolicy) -> Self {
        let dialect = version.dialect();
        Self {
            scorm_version: version,
            completion_status: policy,
            api: ApiConfig {
                global: dialect.api_global(),
                calls: dialect.calls(),
            },
            start_writes: dialect.start_writes(),
            finish_writes: FinishWrites {
                passed: dialect.status_writes(policy, true),
                failed: dialect.status_writes(policy, false),
            },
            score_paths: dialect.score_paths(),
            total_slides: course.slides.len(),
            total_questions: course.questions.len(),
            has_video: course.has_video(),
            passing_correct_answers: passing_correct_answers(course.questions.len()),
            tick_ms: TICK_MS,
            music_volume: MUSIC_VOLUME,
            max_discovery_hops: MAX_DISCOVERY_HOPS,
            labels: RuntimeLabels::default(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATION
// ═══════════════════════════════════════════════════════════════════════════════

pub fn generate_runtime_script(config: &RuntimeConfig) -> Result<String, SynthError> {
    if TEMPLATE.matches(CONFIG_PLACEHOLDER).count() != 1 {
        return Err(SynthError::Script(
            "runtime template must contain the configuration placeholder exactly once".into(),
        ));
    }
    let json = serde_json::to_string(config).map_err(|e| SynthError::Script(e.to_string()))?;
    Ok(TEMPLATE.replace(CONFIG_PLACEHOLDER, &json))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTAX GATE
// ═══════════════════════════════════════════════════════════════════════════════

struct DeclarationCollector {
    names: HashSet<String>,
}

impl<'a> Visit<'a> for DeclarationCollector {
    fn visit_binding_identifier(&mut self, ident: &oxc_ast::ast::BindingIdentifier<'a>) {
        self.names.insert(ident.name.to_string());
    }
}

/// Parse `script` and confirm every name in `required` is declared.
pub fn check_script_syntax(script: &str, required: &[&str]) -> Result<(), SynthError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, script, SourceType::default()).parse();

    if !ret.errors.is_empty() {
        let messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        return Err(SynthError::Script(messages.join("; ")));
    }

    let mut collector = DeclarationCollector {
        names: HashSet::new(),
    };
    collector.visit_program(&ret.program);

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !collector.names.contains(*name))
        .collect();
    if !missing.is_empty() {
        return Err(SynthError::Script(format!(
            "missing declarations: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::{Question, Slide};

    fn course() -> CourseDocument {
        CourseDocument {
            title: "T".into(),
            slides: vec![Slide {
                title: "S".into(),
                content: "c".into(),
                image_asset: None,
            }],
            video: None,
            questions: (0..10)
                .map(|i| Question {
                    text: format!("q{}", i),
                    alternatives: vec!["a".into(), "b".into()],
                    correct_index: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn test_template_has_single_placeholder() {
        assert_eq!(TEMPLATE.matches(CONFIG_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn test_config_json_shape() {
        let config = RuntimeConfig::new(&course(), ScormVersion::V2004, CompletionPolicy::PassedFailed);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["scormVersion"], "2004");
        assert_eq!(value["completionStatus"], "passed-failed");
        assert_eq!(value["api"]["global"], "API_1484_11");
        assert_eq!(value["api"]["calls"]["finish"], "Terminate");
        assert_eq!(value["passingCorrectAnswers"], 7);
        assert_eq!(value["tickMs"], 100);
        assert_eq!(value["maxDiscoveryHops"], 500);
        assert_eq!(value["hasVideo"], false);
        assert_eq!(
            value["finishWrites"]["failed"][1],
            serde_json::json!(["cmi.success_status", "failed"])
        );
        assert_eq!(value["scorePaths"]["max"], "cmi.score.max");
    }

    #[test]
    fn test_generated_script_passes_gate() {
        for version in [ScormVersion::V1_2, ScormVersion::V2004] {
            let config = RuntimeConfig::new(&course(), version, CompletionPolicy::Completed);
            let script = generate_runtime_script(&config).unwrap();
            assert!(!script.contains(CONFIG_PLACEHOLDER));
            assert!(script.contains(version.dialect().api_global()));
            check_script_syntax(&script, REQUIRED_ENTRY_POINTS).unwrap();
        }
    }

    #[test]
    fn test_gate_rejects_broken_script() {
        let err = check_script_syntax("function a( {", &[]).unwrap_err();
        assert!(matches!(err, SynthError::Script(_)));
    }

    #[test]
    fn test_gate_reports_missing_entry_point() {
        let err = check_script_syntax("function tick() {}", &["tick", "handleNext"]).unwrap_err();
        assert!(err.to_string().contains("handleNext"));
    }
}
