#[cfg(test)]
mod tests {
    use crate::lms::{
        discover_api, ApiLocation, LmsApi, LmsFault, LmsSession, SessionState, WindowHierarchy,
    };
    use crate::scorm::{CompletionPolicy, ScormVersion};
    use std::cell::RefCell;
    use std::rc::Rc;

    // ─── Frame tree double ─────────────────────────────────────────────────

    #[derive(Default, Clone)]
    struct Frame {
        parent: Option<usize>,
        opener: Option<usize>,
        globals: Vec<&'static str>,
    }

    struct Frames(Vec<Frame>);

    impl WindowHierarchy for Frames {
        type Window = usize;

        fn has_global(&self, window: usize, name: &str) -> bool {
            self.0[window].globals.iter().any(|g| *g == name)
        }

        fn parent(&self, window: usize) -> Option<usize> {
            self.0[window].parent
        }

        fn opener(&self, window: usize) -> Option<usize> {
            self.0[window].opener
        }
    }

    /// Frame `i` is parented by frame `i - 1`; frame 0 is the self-parented top.
    fn chain(len: usize, api_at_top: bool) -> Frames {
        let frames = (0..len)
            .map(|i| Frame {
                parent: Some(i.saturating_sub(1)),
                opener: None,
                globals: if i == 0 && api_at_top { vec!["API"] } else { vec![] },
            })
            .collect();
        Frames(frames)
    }

    #[test]
    fn test_discovery_walks_parents() {
        let frames = chain(3, true);
        assert_eq!(
            discover_api(&frames, 2, "API"),
            ApiLocation::Found {
                window: 0,
                hops: 2,
                via_opener: false
            }
        );
    }

    #[test]
    fn test_discovery_finds_api_in_own_window() {
        let mut frames = chain(1, false);
        frames.0[0].globals.push("API_1484_11");
        assert_eq!(
            discover_api(&frames, 0, "API_1484_11"),
            ApiLocation::Found {
                window: 0,
                hops: 0,
                via_opener: false
            }
        );
        assert_eq!(discover_api(&frames, 0, "API"), ApiLocation::Standalone);
    }

    #[test]
    fn test_discovery_stops_at_self_parented_top() {
        let frames = chain(4, false);
        assert_eq!(discover_api(&frames, 3, "API"), ApiLocation::Standalone);
    }

    #[test]
    fn test_discovery_falls_back_to_opener() {
        let frames = Frames(vec![
            // Popup holding the course.
            Frame {
                parent: Some(0),
                opener: Some(1),
                globals: vec![],
            },
            // LMS content frame that opened it.
            Frame {
                parent: Some(2),
                opener: None,
                globals: vec![],
            },
            // LMS top window.
            Frame {
                parent: None,
                opener: None,
                globals: vec!["API"],
            },
        ]);
        assert_eq!(
            discover_api(&frames, 0, "API"),
            ApiLocation::Found {
                window: 2,
                hops: 1,
                via_opener: true
            }
        );
    }

    #[test]
    fn test_discovery_hop_cap() {
        let frames = chain(501, true);
        assert_eq!(
            discover_api(&frames, 499, "API"),
            ApiLocation::Found {
                window: 0,
                hops: 499,
                via_opener: false
            }
        );
        assert_eq!(discover_api(&frames, 500, "API"), ApiLocation::Standalone);
    }

    // ─── LMS double ────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingLms {
        log: Rc<RefCell<Vec<String>>>,
        throw_on: Option<&'static str>,
        refuse_initialize: bool,
    }

    impl LmsApi for RecordingLms {
        fn call(&mut self, function: &str, args: &[&str]) -> Result<String, LmsFault> {
            self.log
                .borrow_mut()
                .push(format!("{}({})", function, args.join(", ")));
            if self.throw_on == Some(function) {
                return Err(LmsFault::Threw("boom".into()));
            }
            if function.ends_with("GetLastError") {
                return Ok("101".into());
            }
            if function.ends_with("Initialize") && self.refuse_initialize {
                return Ok("false".into());
            }
            Ok("true".into())
        }
    }

    fn session(
        lms: RecordingLms,
        version: ScormVersion,
        policy: CompletionPolicy,
    ) -> (LmsSession<RecordingLms>, Rc<RefCell<Vec<String>>>) {
        let log = lms.log.clone();
        (LmsSession::new(Some(lms), version, policy), log)
    }

    fn drain(log: &Rc<RefCell<Vec<String>>>) -> Vec<String> {
        log.borrow_mut().drain(..).collect()
    }

    #[test]
    fn test_scorm12_completed_lifecycle() {
        let (mut s, log) = session(
            RecordingLms::default(),
            ScormVersion::V1_2,
            CompletionPolicy::Completed,
        );

        assert!(s.initialize());
        assert_eq!(s.state(), SessionState::Initialized);
        assert_eq!(
            drain(&log),
            vec![
                "LMSInitialize()",
                "LMSSetValue(cmi.core.lesson_status, incomplete)",
                "LMSCommit()",
            ]
        );

        assert!(s.finish(1, 1));
        assert_eq!(
            drain(&log),
            vec![
                "LMSSetValue(cmi.core.lesson_status, completed)",
                "LMSSetValue(cmi.core.score.raw, 100)",
                "LMSCommit()",
                "LMSFinish()",
            ]
        );
        assert_eq!(s.state(), SessionState::Finished);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let (mut s, log) = session(
            RecordingLms::default(),
            ScormVersion::V1_2,
            CompletionPolicy::Completed,
        );
        s.initialize();
        s.finish(1, 1);
        drain(&log);

        assert!(!s.finish(1, 1));
        assert!(!s.finish(0, 1));
        s.commit_on_unload();
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn test_scorm2004_passed_failed_writes() {
        let (mut s, log) = session(
            RecordingLms::default(),
            ScormVersion::V2004,
            CompletionPolicy::PassedFailed,
        );
        s.initialize();
        assert_eq!(
            drain(&log),
            vec![
                "Initialize()",
                "SetValue(cmi.completion_status, incomplete)",
                "Commit()",
            ]
        );

        // 1 of 3: the threshold is ceil(2.1) = 3.
        s.finish(1, 3);
        assert_eq!(
            drain(&log),
            vec![
                "SetValue(cmi.completion_status, completed)",
                "SetValue(cmi.success_status, failed)",
                "SetValue(cmi.score.raw, 33)",
                "SetValue(cmi.score.min, 0)",
                "SetValue(cmi.score.max, 100)",
                "Commit()",
                "Terminate()",
            ]
        );
    }

    #[test]
    fn test_scorm12_passed_failed_reports_passed() {
        let (mut s, log) = session(
            RecordingLms::default(),
            ScormVersion::V1_2,
            CompletionPolicy::PassedFailed,
        );
        s.initialize();
        drain(&log);
        s.finish(7, 10);
        let calls = drain(&log);
        assert_eq!(calls[0], "LMSSetValue(cmi.core.lesson_status, passed)");
        assert_eq!(calls[1], "LMSSetValue(cmi.core.score.raw, 70)");
    }

    #[test]
    fn test_refused_initialize_degrades() {
        let lms = RecordingLms {
            refuse_initialize: true,
            ..RecordingLms::default()
        };
        let (mut s, log) = session(lms, ScormVersion::V1_2, CompletionPolicy::Completed);

        assert!(!s.initialize());
        assert!(s.is_standalone());
        assert_eq!(s.state(), SessionState::Uninitialized);
        assert_eq!(drain(&log), vec!["LMSInitialize()", "LMSGetLastError()"]);

        assert!(s.finish(1, 1));
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn test_throwing_api_degrades_without_panicking() {
        let lms = RecordingLms {
            throw_on: Some("SetValue"),
            ..RecordingLms::default()
        };
        let (mut s, log) = session(lms, ScormVersion::V2004, CompletionPolicy::Completed);

        assert!(s.initialize());
        assert!(s.is_standalone());
        assert_eq!(
            drain(&log),
            vec!["Initialize()", "SetValue(cmi.completion_status, incomplete)"]
        );

        assert!(s.finish(1, 1));
        assert!(s.is_finished());
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn test_commit_on_unload() {
        let (mut s, log) = session(
            RecordingLms::default(),
            ScormVersion::V1_2,
            CompletionPolicy::Completed,
        );
        s.commit_on_unload();
        assert!(drain(&log).is_empty());

        s.initialize();
        drain(&log);
        s.commit_on_unload();
        assert_eq!(drain(&log), vec!["LMSCommit()"]);
    }

    #[test]
    fn test_standalone_session() {
        let mut s: LmsSession<RecordingLms> =
            LmsSession::new(None, ScormVersion::V2004, CompletionPolicy::PassedFailed);
        assert!(s.is_standalone());
        assert!(!s.initialize());
        assert!(s.finish(0, 2));
        assert!(!s.finish(0, 2));
        assert_eq!(s.state(), SessionState::Finished);
    }
}
