//! Quiz scoring protocol.
//!
//! Untimed, unlimited attempts, one credit per question. A correct selection
//! locks the question and earns its credit; an incorrect one is only reported
//! and cleared, so retries never cost anything.

use crate::course::Question;

/// Share of questions that must be answered correctly to pass.
pub const PASS_RATIO: f64 = 0.7;

/// Correct answers required to pass, `ceil(total * 0.7)`.
///
/// Computed with `f64` so it matches the browser's arithmetic exactly.
pub fn passing_correct_answers(total_questions: usize) -> usize {
    (total_questions as f64 * PASS_RATIO).ceil() as usize
}

/// `round(correct / total * 100)`, the raw score sent to the LMS.
pub fn score_percent(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (correct as f64 / total as f64 * 100.0).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    /// The selection is cleared and the question stays open.
    Incorrect,
    /// The question was already answered correctly; inputs are locked.
    Locked,
}

#[derive(Debug, Clone)]
pub struct QuizScorer {
    correct_indices: Vec<usize>,
    answered: Vec<bool>,
    correct_answers: usize,
}

impl QuizScorer {
    pub fn new(correct_indices: Vec<usize>) -> Self {
        let answered = vec![false; correct_indices.len()];
        Self {
            correct_indices,
            answered,
            correct_answers: 0,
        }
    }

    pub fn from_questions(questions: &[Question]) -> Self {
        Self::new(questions.iter().map(|q| q.correct_index).collect())
    }

    /// Select alternative `choice` on question `question`.
    ///
    /// Out-of-range questions report `Locked`; there is nothing to answer.
    pub fn select(&mut self, question: usize, choice: usize) -> AnswerOutcome {
        let Some(&correct) = self.correct_indices.get(question) else {
            return AnswerOutcome::Locked;
        };
        if self.answered[question] {
            return AnswerOutcome::Locked;
        }
        if choice == correct {
            self.answered[question] = true;
            self.correct_answers += 1;
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect
        }
    }

    pub fn is_answered(&self, question: usize) -> bool {
        self.answered.get(question).copied().unwrap_or(false)
    }

    pub fn correct_answers(&self) -> usize {
        self.correct_answers
    }

    pub fn total_questions(&self) -> usize {
        self.correct_indices.len()
    }

    pub fn passed(&self) -> bool {
        self.correct_answers >= passing_correct_answers(self.total_questions())
    }

    pub fn score(&self) -> u32 {
        score_percent(self.correct_answers, self.total_questions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passing_threshold() {
        assert_eq!(passing_correct_answers(1), 1);
        assert_eq!(passing_correct_answers(3), 3);
        assert_eq!(passing_correct_answers(5), 4);
        assert_eq!(passing_correct_answers(10), 7);
    }

    #[test]
    fn test_score_percent_rounds() {
        assert_eq!(score_percent(1, 1), 100);
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(1, 8), 13);
        assert_eq!(score_percent(0, 0), 0);
    }

    #[test]
    fn test_wrong_then_right_earns_full_credit() {
        let mut quiz = QuizScorer::new(vec![1]);
        assert_eq!(quiz.select(0, 0), AnswerOutcome::Incorrect);
        assert!(!quiz.is_answered(0));
        assert_eq!(quiz.select(0, 0), AnswerOutcome::Incorrect);
        assert_eq!(quiz.select(0, 1), AnswerOutcome::Correct);
        assert!(quiz.is_answered(0));
        assert_eq!(quiz.correct_answers(), 1);
        assert_eq!(quiz.score(), 100);
        assert!(quiz.passed());
    }

    #[test]
    fn test_locked_after_success() {
        let mut quiz = QuizScorer::new(vec![0, 2]);
        assert_eq!(quiz.select(0, 0), AnswerOutcome::Correct);
        assert_eq!(quiz.select(0, 0), AnswerOutcome::Locked);
        assert_eq!(quiz.select(0, 1), AnswerOutcome::Locked);
        assert_eq!(quiz.correct_answers(), 1);
        assert_eq!(quiz.select(7, 0), AnswerOutcome::Locked);
    }

    #[test]
    fn test_score_independent_of_attempt_history() {
        let correct = vec![3, 0, 1, 2, 1];
        let mut quiz = QuizScorer::new(correct.clone());
        for (q, &c) in correct.iter().enumerate() {
            for wrong in (0..4).filter(|&w| w != c).take(q) {
                assert_eq!(quiz.select(q, wrong), AnswerOutcome::Incorrect);
            }
            assert_eq!(quiz.select(q, c), AnswerOutcome::Correct);
        }
        assert_eq!(quiz.correct_answers(), 5);
        assert_eq!(quiz.score(), 100);
    }
}
