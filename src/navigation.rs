//! Navigation state machine of the unified course player.
//!
//! Sections run in the fixed order slides → video → quiz → completion. The
//! video section exists only when the course carries a video.
//!
//! ## Key Invariants
//!
//! 1. **Slide Overflow**: "next" on the last slide enters the following section.
//! 2. **Video Gate**: "next" out of the video requires the timeline to have
//!    played to completion.
//! 3. **Answer Gate**: "next" out of a question requires it to be answered
//!    correctly; the last question's "next" finishes the course.
//! 4. **Quiz Tab Gate**: jumping straight to the quiz is refused until the
//!    video has been watched.
//! 5. **Dead Ends**: "prev" is unavailable on the first slide and on the
//!    completion screen; "next" is unavailable on the completion screen.

use serde::Serialize;

use crate::scoring::QuizScorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Slides,
    Video,
    Quiz,
    Completion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEffect {
    Moved,
    /// The move is not allowed from the current position.
    Blocked,
    /// The learner reached the completion screen; the session must finish.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpRefusal {
    /// The quiz tab was requested before the video was watched.
    VideoNotWatched,
    /// The section is not reachable by tab.
    NotATab,
}

#[derive(Debug, Clone)]
pub struct Navigator {
    total_slides: usize,
    total_questions: usize,
    has_video: bool,
    section: Section,
    slide: usize,
    question: usize,
    video_completed: bool,
}

impl Navigator {
    pub fn new(total_slides: usize, total_questions: usize, has_video: bool) -> Self {
        Self {
            total_slides,
            total_questions,
            has_video,
            section: Section::Slides,
            slide: 0,
            question: 0,
            video_completed: false,
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn slide(&self) -> usize {
        self.slide
    }

    pub fn question(&self) -> usize {
        self.question
    }

    pub fn video_completed(&self) -> bool {
        self.video_completed
    }

    pub fn mark_video_completed(&mut self) {
        self.video_completed = true;
    }

    /// Restarting the video locks the quiz again.
    pub fn reset_video(&mut self) {
        self.video_completed = false;
    }

    fn section_after_slides(&self) -> Section {
        if self.has_video {
            Section::Video
        } else {
            Section::Quiz
        }
    }

    pub fn can_go_next(&self, quiz: &QuizScorer) -> bool {
        match self.section {
            Section::Slides => true,
            Section::Video => self.video_completed,
            Section::Quiz => quiz.is_answered(self.question),
            Section::Completion => false,
        }
    }

    pub fn can_go_prev(&self) -> bool {
        match self.section {
            Section::Slides => self.slide > 0,
            Section::Video | Section::Quiz => true,
            Section::Completion => false,
        }
    }

    pub fn next(&mut self, quiz: &QuizScorer) -> NavEffect {
        if !self.can_go_next(quiz) {
            return NavEffect::Blocked;
        }
        match self.section {
            Section::Slides => {
                if self.slide + 1 < self.total_slides {
                    self.slide += 1;
                } else {
                    self.section = self.section_after_slides();
                }
                NavEffect::Moved
            }
            Section::Video => {
                self.section = Section::Quiz;
                NavEffect::Moved
            }
            Section::Quiz => {
                if self.question + 1 < self.total_questions {
                    self.question += 1;
                    NavEffect::Moved
                } else {
                    self.section = Section::Completion;
                    NavEffect::Finished
                }
            }
            Section::Completion => NavEffect::Blocked,
        }
    }

    pub fn prev(&mut self) -> NavEffect {
        if !self.can_go_prev() {
            return NavEffect::Blocked;
        }
        match self.section {
            Section::Slides => {
                self.slide -= 1;
            }
            Section::Video => {
                self.slide = self.total_slides.saturating_sub(1);
                self.section = Section::Slides;
            }
            Section::Quiz => {
                if self.question > 0 {
                    self.question -= 1;
                } else if self.has_video {
                    self.section = Section::Video;
                } else {
                    self.slide = self.total_slides.saturating_sub(1);
                    self.section = Section::Slides;
                }
            }
            Section::Completion => return NavEffect::Blocked,
        }
        NavEffect::Moved
    }

    /// Tab navigation. Positions inside each section are preserved.
    pub fn jump_to(&mut self, section: Section) -> Result<(), JumpRefusal> {
        match section {
            Section::Completion => Err(JumpRefusal::NotATab),
            Section::Video if !self.has_video => Err(JumpRefusal::NotATab),
            Section::Quiz if self.has_video && !self.video_completed => {
                Err(JumpRefusal::VideoNotWatched)
            }
            _ => {
                self.section = section;
                Ok(())
            }
        }
    }

    pub fn total_steps(&self) -> usize {
        self.total_slides + usize::from(self.has_video) + self.total_questions + 1
    }

    /// Zero-based position across all sections.
    pub fn global_step(&self) -> usize {
        let video_steps = usize::from(self.has_video);
        match self.section {
            Section::Slides => self.slide,
            Section::Video => self.total_slides,
            Section::Quiz => self.total_slides + video_steps + self.question,
            Section::Completion => self.total_steps() - 1,
        }
    }

    /// `(global_step + 1) / total_steps`.
    pub fn progress(&self) -> f64 {
        (self.global_step() + 1) as f64 / self.total_steps() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_walk_with_video() {
        let mut nav = Navigator::new(2, 2, true);
        let mut quiz = QuizScorer::new(vec![0, 1]);

        assert!(!nav.can_go_prev());
        assert_eq!(nav.prev(), NavEffect::Blocked);
        assert_eq!(nav.next(&quiz), NavEffect::Moved);
        assert_eq!(nav.slide(), 1);
        assert_eq!(nav.next(&quiz), NavEffect::Moved);
        assert_eq!(nav.section(), Section::Video);

        assert_eq!(nav.next(&quiz), NavEffect::Blocked);
        nav.mark_video_completed();
        assert_eq!(nav.next(&quiz), NavEffect::Moved);
        assert_eq!(nav.section(), Section::Quiz);

        assert_eq!(nav.next(&quiz), NavEffect::Blocked);
        quiz.select(0, 0);
        assert_eq!(nav.next(&quiz), NavEffect::Moved);
        assert_eq!(nav.question(), 1);
        quiz.select(1, 1);
        assert_eq!(nav.next(&quiz), NavEffect::Finished);
        assert_eq!(nav.section(), Section::Completion);
        assert!(!nav.can_go_next(&quiz));
        assert!(!nav.can_go_prev());
        assert_eq!(nav.progress(), 1.0);
    }

    #[test]
    fn test_prev_chain() {
        let mut nav = Navigator::new(3, 1, true);
        let quiz = QuizScorer::new(vec![0]);
        nav.next(&quiz);
        nav.next(&quiz);
        nav.next(&quiz);
        nav.mark_video_completed();
        nav.next(&quiz);
        assert_eq!(nav.section(), Section::Quiz);

        assert_eq!(nav.prev(), NavEffect::Moved);
        assert_eq!(nav.section(), Section::Video);
        assert_eq!(nav.prev(), NavEffect::Moved);
        assert_eq!(nav.section(), Section::Slides);
        assert_eq!(nav.slide(), 2);
    }

    #[test]
    fn test_without_video_slides_lead_to_quiz() {
        let mut nav = Navigator::new(1, 1, false);
        let quiz = QuizScorer::new(vec![0]);
        assert_eq!(nav.total_steps(), 3);
        assert_eq!(nav.next(&quiz), NavEffect::Moved);
        assert_eq!(nav.section(), Section::Quiz);
        assert_eq!(nav.global_step(), 1);
        assert_eq!(nav.prev(), NavEffect::Moved);
        assert_eq!(nav.section(), Section::Slides);
        assert_eq!(nav.jump_to(Section::Quiz), Ok(()));
        assert_eq!(nav.jump_to(Section::Video), Err(JumpRefusal::NotATab));
    }

    #[test]
    fn test_quiz_tab_gate() {
        let mut nav = Navigator::new(1, 1, true);
        assert_eq!(nav.jump_to(Section::Quiz), Err(JumpRefusal::VideoNotWatched));
        assert_eq!(nav.section(), Section::Slides);
        assert_eq!(nav.jump_to(Section::Video), Ok(()));
        nav.mark_video_completed();
        assert_eq!(nav.jump_to(Section::Quiz), Ok(()));

        nav.reset_video();
        assert_eq!(nav.jump_to(Section::Quiz), Err(JumpRefusal::VideoNotWatched));
    }

    #[test]
    fn test_progress_steps() {
        let mut nav = Navigator::new(4, 3, true);
        let quiz = QuizScorer::new(vec![0, 0, 0]);
        assert_eq!(nav.total_steps(), 4 + 1 + 3 + 1);
        assert_eq!(nav.progress(), 1.0 / 9.0);
        for _ in 0..4 {
            nav.next(&quiz);
        }
        assert_eq!(nav.section(), Section::Video);
        assert_eq!(nav.global_step(), 4);
        nav.mark_video_completed();
        nav.next(&quiz);
        assert_eq!(nav.global_step(), 5);
    }
}
