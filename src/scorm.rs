//! SCORM version strategy.
//!
//! Everything that differs between SCORM 1.2 and SCORM 2004 lives behind
//! [`ScormDialect`], selected once per synthesis from a [`ScormVersion`].
//! The manifest builder, the runtime configuration and the session model all
//! read from the same dialect, so the two editions cannot drift apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validate::SynthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScormVersion {
    #[default]
    #[serde(rename = "1.2")]
    V1_2,
    #[serde(rename = "2004")]
    V2004,
}

impl ScormVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_2 => "1.2",
            Self::V2004 => "2004",
        }
    }

    pub fn dialect(&self) -> &'static dyn ScormDialect {
        match self {
            Self::V1_2 => &Scorm12,
            Self::V2004 => &Scorm2004,
        }
    }
}

impl fmt::Display for ScormVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScormVersion {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.2" => Ok(Self::V1_2),
            "2004" => Ok(Self::V2004),
            other => Err(SynthError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// How the final outcome is reported to the LMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompletionPolicy {
    /// Always report plain completion.
    #[default]
    #[serde(rename = "completed")]
    Completed,
    /// Report passed/failed against the passing threshold.
    #[serde(rename = "passed-failed")]
    PassedFailed,
}

impl CompletionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::PassedFailed => "passed-failed",
        }
    }
}

impl fmt::Display for CompletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletionPolicy {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "completed" => Ok(Self::Completed),
            "passed-failed" => Ok(Self::PassedFailed),
            other => Err(SynthError::UnsupportedCompletionPolicy(other.to_string())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIALECT
// ═══════════════════════════════════════════════════════════════════════════════

/// Names of the runtime API functions for one SCORM edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LmsCalls {
    pub initialize: &'static str,
    pub get_value: &'static str,
    pub set_value: &'static str,
    pub commit: &'static str,
    pub finish: &'static str,
    pub get_last_error: &'static str,
}

/// Data model elements that receive the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePaths {
    pub raw: &'static str,
    pub min: Option<&'static str>,
    pub max: Option<&'static str>,
}

/// A single `SetValue(element, value)` write.
pub type DataWrite = (&'static str, &'static str);

pub trait ScormDialect: Sync {
    fn version(&self) -> ScormVersion;

    /// Global handle searched for during API discovery.
    fn api_global(&self) -> &'static str;

    fn calls(&self) -> LmsCalls;

    /// `<schemaversion>` text of the manifest metadata.
    fn schema_version(&self) -> &'static str;

    /// Namespace declarations and schema locations of the manifest root.
    fn manifest_namespaces(&self) -> &'static str;

    /// Attribute marking the launchable resource as a SCO.
    fn sco_type_attribute(&self) -> &'static str;

    /// Writes performed right after a successful initialize.
    fn start_writes(&self) -> Vec<DataWrite>;

    /// Status writes performed when the session finishes.
    fn status_writes(&self, policy: CompletionPolicy, passed: bool) -> Vec<DataWrite>;

    fn score_paths(&self) -> ScorePaths;
}

pub struct Scorm12;
pub struct Scorm2004;

const CALLS_1_2: LmsCalls = LmsCalls {
    initialize: "LMSInitialize",
    get_value: "LMSGetValue",
    set_value: "LMSSetValue",
    commit: "LMSCommit",
    finish: "LMSFinish",
    get_last_error: "LMSGetLastError",
};

const CALLS_2004: LmsCalls = LmsCalls {
    initialize: "Initialize",
    get_value: "GetValue",
    set_value: "SetValue",
    commit: "Commit",
    finish: "Terminate",
    get_last_error: "GetLastError",
};

const NAMESPACES_1_2: &str = r#"xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"
  xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_rootv1p2"
  xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
  xsi:schemaLocation="http://www.imsproject.org/xsd/imscp_rootv1p1p2 imscp_rootv1p1p2.xsd
                      http://www.adlnet.org/xsd/adlcp_rootv1p2 adlcp_rootv1p2.xsd""#;

const NAMESPACES_2004: &str = r#"xmlns="http://www.imsglobal.org/xsd/imscp_v1p1"
  xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_v1p3"
  xmlns:adlseq="http://www.adlnet.org/xsd/adlseq_v1p3"
  xmlns:adlnav="http://www.adlnet.org/xsd/adlnav_v1p3"
  xmlns:imsss="http://www.imsglobal.org/xsd/imsss"
  xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
  xsi:schemaLocation="http://www.imsglobal.org/xsd/imscp_v1p1 imscp_v1p1.xsd
                      http://www.adlnet.org/xsd/adlcp_v1p3 adlcp_v1p3.xsd
                      http://www.adlnet.org/xsd/adlseq_v1p3 adlseq_v1p3.xsd
                      http://www.adlnet.org/xsd/adlnav_v1p3 adlnav_v1p3.xsd
                      http://www.imsglobal.org/xsd/imsss imsss_v1p0.xsd""#;

fn outcome(passed: bool) -> &'static str {
    if passed {
        "passed"
    } else {
        "failed"
    }
}

impl ScormDialect for Scorm12 {
    fn version(&self) -> ScormVersion {
        ScormVersion::V1_2
    }

    fn api_global(&self) -> &'static str {
        "API"
    }

    fn calls(&self) -> LmsCalls {
        CALLS_1_2
    }

    fn schema_version(&self) -> &'static str {
        "1.2"
    }

    fn manifest_namespaces(&self) -> &'static str {
        NAMESPACES_1_2
    }

    fn sco_type_attribute(&self) -> &'static str {
        r#"adlcp:scormtype="sco""#
    }

    fn start_writes(&self) -> Vec<DataWrite> {
        vec![("cmi.core.lesson_status", "incomplete")]
    }

    fn status_writes(&self, policy: CompletionPolicy, passed: bool) -> Vec<DataWrite> {
        match policy {
            CompletionPolicy::Completed => vec![("cmi.core.lesson_status", "completed")],
            CompletionPolicy::PassedFailed => vec![("cmi.core.lesson_status", outcome(passed))],
        }
    }

    fn score_paths(&self) -> ScorePaths {
        ScorePaths {
            raw: "cmi.core.score.raw",
            min: None,
            max: None,
        }
    }
}

impl ScormDialect for Scorm2004 {
    fn version(&self) -> ScormVersion {
        ScormVersion::V2004
    }

    fn api_global(&self) -> &'static str {
        "API_1484_11"
    }

    fn calls(&self) -> LmsCalls {
        CALLS_2004
    }

    fn schema_version(&self) -> &'static str {
        "2004 4th Edition"
    }

    fn manifest_namespaces(&self) -> &'static str {
        NAMESPACES_2004
    }

    fn sco_type_attribute(&self) -> &'static str {
        r#"adlcp:scormType="sco""#
    }

    fn start_writes(&self) -> Vec<DataWrite> {
        vec![("cmi.completion_status", "incomplete")]
    }

    fn status_writes(&self, policy: CompletionPolicy, passed: bool) -> Vec<DataWrite> {
        let mut writes = vec![("cmi.completion_status", "completed")];
        if policy == CompletionPolicy::PassedFailed {
            writes.push(("cmi.success_status", outcome(passed)));
        }
        writes
    }

    fn score_paths(&self) -> ScorePaths {
        ScorePaths {
            raw: "cmi.score.raw",
            min: Some("cmi.score.min"),
            max: Some("cmi.score.max"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_round_trip() {
        assert_eq!("1.2".parse::<ScormVersion>().unwrap(), ScormVersion::V1_2);
        assert_eq!("2004".parse::<ScormVersion>().unwrap(), ScormVersion::V2004);
        assert!(matches!(
            "2004 3rd".parse::<ScormVersion>(),
            Err(SynthError::UnsupportedVersion(_))
        ));
        let json = serde_json::to_string(&ScormVersion::V2004).unwrap();
        assert_eq!(json, "\"2004\"");
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "passed-failed".parse::<CompletionPolicy>().unwrap(),
            CompletionPolicy::PassedFailed
        );
        assert!("passed".parse::<CompletionPolicy>().is_err());
    }

    #[test]
    fn test_api_globals() {
        assert_eq!(ScormVersion::V1_2.dialect().api_global(), "API");
        assert_eq!(ScormVersion::V2004.dialect().api_global(), "API_1484_11");
        assert_eq!(ScormVersion::V2004.dialect().calls().finish, "Terminate");
        assert_eq!(ScormVersion::V1_2.dialect().calls().finish, "LMSFinish");
    }

    #[test]
    fn test_status_writes_per_policy() {
        let v12 = ScormVersion::V1_2.dialect();
        assert_eq!(
            v12.status_writes(CompletionPolicy::Completed, false),
            vec![("cmi.core.lesson_status", "completed")]
        );
        assert_eq!(
            v12.status_writes(CompletionPolicy::PassedFailed, false),
            vec![("cmi.core.lesson_status", "failed")]
        );

        let v2004 = ScormVersion::V2004.dialect();
        assert_eq!(
            v2004.status_writes(CompletionPolicy::Completed, true),
            vec![("cmi.completion_status", "completed")]
        );
        assert_eq!(
            v2004.status_writes(CompletionPolicy::PassedFailed, true),
            vec![
                ("cmi.completion_status", "completed"),
                ("cmi.success_status", "passed")
            ]
        );
    }
}
