//! LMS communication: API discovery and the session lifecycle.
//!
//! Executable model of what the runtime script does against the host LMS.
//!
//! ## Key Invariants
//!
//! 1. **Discovery Order**: walk `parent` from the content window (at most
//!    [`MAX_DISCOVERY_HOPS`] hops, stopping at a self-parented window), then the
//!    same walk from `opener`, else run standalone.
//! 2. **Lifecycle**: `Uninitialized → Initialized → Finished`. Initialize is
//!    followed by an `incomplete` status write and a commit.
//! 3. **Finish Once**: the finish transition runs at most once; a second call
//!    issues no LMS traffic.
//! 4. **Never Propagate**: a throwing or failing host API is logged and the
//!    session degrades to standalone. Learner-facing state is unaffected.

use thiserror::Error;

use crate::scorm::{CompletionPolicy, ScormDialect, ScormVersion};
use crate::scoring::{passing_correct_answers, score_percent};

pub const MAX_DISCOVERY_HOPS: usize = 500;

// ═══════════════════════════════════════════════════════════════════════════════
// API DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// A browsing-context tree as seen from the content window.
pub trait WindowHierarchy {
    type Window: Copy + PartialEq;

    fn has_global(&self, window: Self::Window, name: &str) -> bool;

    /// `None`, or the window itself, marks the top of the hierarchy.
    fn parent(&self, window: Self::Window) -> Option<Self::Window>;

    fn opener(&self, window: Self::Window) -> Option<Self::Window>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiLocation<W> {
    Found {
        window: W,
        hops: usize,
        via_opener: bool,
    },
    Standalone,
}

fn walk_parents<H: WindowHierarchy>(
    hierarchy: &H,
    start: H::Window,
    global: &str,
    max_hops: usize,
) -> Option<(H::Window, usize)> {
    let mut window = start;
    let mut hops = 0;
    while hops < max_hops {
        if hierarchy.has_global(window, global) {
            return Some((window, hops));
        }
        match hierarchy.parent(window) {
            Some(parent) if parent != window => {
                window = parent;
                hops += 1;
            }
            _ => break,
        }
    }
    None
}

pub fn discover_api<H: WindowHierarchy>(
    hierarchy: &H,
    start: H::Window,
    global: &str,
) -> ApiLocation<H::Window> {
    if let Some((window, hops)) = walk_parents(hierarchy, start, global, MAX_DISCOVERY_HOPS) {
        return ApiLocation::Found {
            window,
            hops,
            via_opener: false,
        };
    }

    if let Some(opener) = hierarchy.opener(start) {
        if let Some((window, hops)) = walk_parents(hierarchy, opener, global, MAX_DISCOVERY_HOPS)
        {
            return ApiLocation::Found {
                window,
                hops,
                via_opener: true,
            };
        }
    }

    log::warn!("[SCORM] {} not found - running in standalone mode", global);
    ApiLocation::Standalone
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOST API
// ═══════════════════════════════════════════════════════════════════════════════

/// A host-side failure: the JavaScript call threw or was not there to call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LmsFault {
    #[error("API function {0} is missing")]
    Missing(String),
    #[error("API call threw: {0}")]
    Threw(String),
}

/// The LMS-provided API object (`API` or `API_1484_11`).
///
/// Every function of both editions takes string arguments and returns a
/// string (`"true"`/`"false"` for state-changing calls).
pub trait LmsApi {
    fn call(&mut self, function: &str, args: &[&str]) -> Result<String, LmsFault>;
}

fn is_success(result: &str) -> bool {
    result == "true"
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Finished,
}

pub struct LmsSession<A: LmsApi> {
    api: Option<A>,
    dialect: &'static dyn ScormDialect,
    policy: CompletionPolicy,
    state: SessionState,
    finished: bool,
}

impl<A: LmsApi> LmsSession<A> {
    /// `api` is the discovery result; `None` means standalone mode.
    pub fn new(api: Option<A>, version: ScormVersion, policy: CompletionPolicy) -> Self {
        Self {
            api,
            dialect: version.dialect(),
            policy,
            state: SessionState::Uninitialized,
            finished: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_standalone(&self) -> bool {
        self.api.is_none()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn degrade(&mut self, reason: &str) {
        log::warn!("[SCORM] {} - continuing in standalone mode", reason);
        self.api = None;
    }

    fn last_error(&mut self) -> String {
        let function = self.dialect.calls().get_last_error;
        match self.api.as_mut().map(|api| api.call(function, &[])) {
            Some(Ok(code)) => code,
            _ => "0".to_string(),
        }
    }

    /// Issue one API call. Faults degrade the session and yield `None`.
    fn call(&mut self, function: &str, args: &[&str]) -> Option<String> {
        let Some(api) = self.api.as_mut() else {
            log::debug!("[SCORM] standalone: skipped {}({:?})", function, args);
            return None;
        };
        match api.call(function, args) {
            Ok(result) => {
                if result == "false" {
                    let code = self.last_error();
                    log::warn!("[SCORM] {} returned false (error {})", function, code);
                }
                Some(result)
            }
            Err(fault) => {
                self.degrade(&format!("{} failed: {}", function, fault));
                None
            }
        }
    }

    fn set_value(&mut self, element: &str, value: &str) {
        let function = self.dialect.calls().set_value;
        self.call(function, &[element, value]);
    }

    fn commit(&mut self) {
        let function = self.dialect.calls().commit;
        self.call(function, &[""]);
    }

    /// Enter `Initialized`. Returns `false` in standalone mode.
    pub fn initialize(&mut self) -> bool {
        if self.state != SessionState::Uninitialized {
            return self.state == SessionState::Initialized;
        }
        if self.api.is_none() {
            return false;
        }

        let function = self.dialect.calls().initialize;
        match self.call(function, &[""]) {
            Some(result) if is_success(&result) => {}
            Some(_) => {
                self.degrade("initialize was refused");
                return false;
            }
            None => return false,
        }

        self.state = SessionState::Initialized;
        for (element, value) in self.dialect.start_writes() {
            self.set_value(element, value);
        }
        self.commit();
        if self.api.is_some() {
            log::info!("[SCORM] session initialized");
        }
        true
    }

    /// Report the outcome and terminate. Only the first call has any effect.
    pub fn finish(&mut self, correct_answers: usize, total_questions: usize) -> bool {
        if self.finished {
            log::debug!("[SCORM] already finished");
            return false;
        }
        self.finished = true;

        let was_initialized = self.state == SessionState::Initialized;
        self.state = SessionState::Finished;
        if !was_initialized {
            return true;
        }

        let passed = correct_answers >= passing_correct_answers(total_questions);
        let score = score_percent(correct_answers, total_questions).to_string();

        for (element, value) in self.dialect.status_writes(self.policy, passed) {
            self.set_value(element, value);
        }
        let paths = self.dialect.score_paths();
        self.set_value(paths.raw, &score);
        if let Some(min) = paths.min {
            self.set_value(min, "0");
        }
        if let Some(max) = paths.max {
            self.set_value(max, "100");
        }
        self.commit();

        let function = self.dialect.calls().finish;
        self.call(function, &[""]);
        log::info!("[SCORM] session finished - passed: {}, score: {}", passed, score);
        true
    }

    /// `beforeunload`: keep partial progress without finishing.
    pub fn commit_on_unload(&mut self) {
        if !self.finished && self.state == SessionState::Initialized {
            self.commit();
        }
    }
}
