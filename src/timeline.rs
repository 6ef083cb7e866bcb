//! Scene Timeline playback engine.
//!
//! Executable model of the video section of the runtime script: a single
//! cooperative loop ticking every [`TICK_MS`] while playing. Time is kept as an
//! integer tick count so `current_time` lands exactly on scene boundaries.
//!
//! ## Key Invariants
//!
//! 1. **Tick Order**: scene changes and progress are only observed per tick.
//! 2. **Boundary Swaps**: the displayed scene changes only when the cumulative
//!    duration window containing `current_time` changes.
//! 3. **Self-Termination**: the loop stops once `current_time >= total_duration`
//!    and the video is marked completed.
//! 4. **Trusted Total**: `total_duration` is the stop condition even when it
//!    disagrees with the scene sum. Excess time stalls on the last scene, a
//!    shortfall truncates it.

use serde::Serialize;

use crate::course::VideoContent;

pub const TICK_MS: u64 = 100;

// ═══════════════════════════════════════════════════════════════════════════════
// EMBEDDED TIMELINE DATA
// ═══════════════════════════════════════════════════════════════════════════════

/// The Scene Timeline serialized into the markup for the runtime script.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineData {
    pub title: String,
    pub total_duration: f64,
    pub scenes: Vec<TimelineScene>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineScene {
    pub narration: String,
    pub duration: f64,
    /// Package path of the scene image or a placeholder `data:` URL.
    pub image: String,
}

/// Index of the scene whose cumulative-duration window contains `time`.
///
/// Times past the last window resolve to the last scene.
pub fn scene_at(durations: &[f64], time: f64) -> usize {
    let mut acc = 0.0;
    for (i, d) in durations.iter().enumerate() {
        acc += d;
        if time < acc {
            return i;
        }
    }
    durations.len().saturating_sub(1)
}

/// `m:ss` display of a number of seconds.
pub fn format_time(seconds: f64) -> String {
    let whole = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAYBACK MODEL
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// Not playing; the tick was ignored.
    Idle,
    /// Time advanced inside the current scene.
    Advanced,
    /// Time crossed into another scene.
    SceneChanged(usize),
    /// `total_duration` reached; playback stopped.
    Completed,
}

#[derive(Debug, Clone)]
pub struct ScenePlayer {
    durations: Vec<f64>,
    total_duration: f64,
    ticks: u64,
    scene_index: usize,
    playing: bool,
    completed: bool,
}

impl ScenePlayer {
    pub fn new(durations: Vec<f64>, total_duration: f64) -> Self {
        Self {
            durations,
            total_duration,
            ticks: 0,
            scene_index: 0,
            playing: false,
            completed: false,
        }
    }

    pub fn from_video(video: &VideoContent) -> Self {
        Self::new(
            video.scenes.iter().map(|s| s.duration).collect(),
            video.total_duration,
        )
    }

    pub fn current_time(&self) -> f64 {
        (self.ticks * TICK_MS) as f64 / 1000.0
    }

    pub fn scene_index(&self) -> usize {
        self.scene_index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Fraction of the timeline played, clamped to `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.completed || self.total_duration <= 0.0 {
            return if self.completed { 1.0 } else { 0.0 };
        }
        (self.current_time() / self.total_duration).min(1.0)
    }

    /// Start the loop. A completed or scene-less video does not play.
    pub fn play(&mut self) -> bool {
        if self.completed || self.durations.is_empty() {
            return false;
        }
        self.playing = true;
        true
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Play/pause button behavior.
    pub fn toggle(&mut self) -> bool {
        if self.playing {
            self.pause();
            false
        } else {
            self.play()
        }
    }

    /// Back to the pre-play condition, including the completed flag.
    pub fn restart(&mut self) {
        self.playing = false;
        self.completed = false;
        self.ticks = 0;
        self.scene_index = 0;
    }

    pub fn tick(&mut self) -> TickEvent {
        if !self.playing {
            return TickEvent::Idle;
        }

        self.ticks += 1;
        let now = self.current_time();

        if now >= self.total_duration {
            self.playing = false;
            self.completed = true;
            return TickEvent::Completed;
        }

        let index = scene_at(&self.durations, now);
        if index != self.scene_index {
            self.scene_index = index;
            TickEvent::SceneChanged(index)
        } else {
            TickEvent::Advanced
        }
    }

    /// Tick until completion or `max_ticks`, returning every event.
    pub fn run(&mut self, max_ticks: u64) -> Vec<TickEvent> {
        let mut events = Vec::new();
        for _ in 0..max_ticks {
            if !self.playing {
                break;
            }
            events.push(self.tick());
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_at_windows() {
        let d = [10.0, 10.0, 10.0];
        assert_eq!(scene_at(&d, 0.0), 0);
        assert_eq!(scene_at(&d, 9.9), 0);
        assert_eq!(scene_at(&d, 10.0), 1);
        assert_eq!(scene_at(&d, 29.9), 2);
        assert_eq!(scene_at(&d, 45.0), 2);
        assert_eq!(scene_at(&[], 1.0), 0);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(600.0), "10:00");
    }

    #[test]
    fn test_three_equal_scenes_complete_at_thirty_seconds() {
        let mut player = ScenePlayer::new(vec![10.0, 10.0, 10.0], 30.0);
        assert!(player.play());

        let mut visited = vec![player.scene_index()];
        let mut ticks = 0;
        while ticks < 305 {
            let event = player.tick();
            ticks += 1;
            match event {
                TickEvent::SceneChanged(i) => visited.push(i),
                TickEvent::Completed => break,
                _ => {}
            }
            if player.current_time() > 20.0 {
                assert_eq!(player.scene_index(), 2);
            }
        }

        assert_eq!(visited, vec![0, 1, 2]);
        assert_eq!(ticks, 300);
        assert_eq!(player.current_time(), 30.0);
        assert_eq!(player.scene_index(), 2);
        assert!(player.is_completed());
        assert!(!player.is_playing());
        assert_eq!(player.progress(), 1.0);
        assert_eq!(player.tick(), TickEvent::Idle);
    }

    #[test]
    fn test_uneven_scenes_visited_once_in_order() {
        let durations = vec![2.5, 0.7, 4.0, 1.3];
        let total: f64 = durations.iter().sum();
        let mut player = ScenePlayer::new(durations, total);
        player.play();
        let events = player.run(10_000);

        let changes: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                TickEvent::SceneChanged(i) => Some(*i),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![1, 2, 3]);
        assert_eq!(events.last(), Some(&TickEvent::Completed));
        assert!((player.current_time() - total).abs() <= 0.1 + 1e-9);
    }

    #[test]
    fn test_pause_resume_and_restart() {
        let mut player = ScenePlayer::new(vec![1.0, 1.0], 2.0);
        player.play();
        player.run(15);
        assert_eq!(player.scene_index(), 1);

        assert!(!player.toggle());
        assert_eq!(player.tick(), TickEvent::Idle);
        assert_eq!(player.current_time(), 1.5);

        assert!(player.toggle());
        player.run(100);
        assert!(player.is_completed());
        assert!(!player.play());

        player.restart();
        assert!(!player.is_completed());
        assert_eq!(player.current_time(), 0.0);
        assert_eq!(player.scene_index(), 0);
        assert!(player.play());
    }

    #[test]
    fn test_total_longer_than_scenes_stalls_on_last_scene() {
        let mut player = ScenePlayer::new(vec![1.0, 1.0], 5.0);
        player.play();
        player.run(40);
        assert_eq!(player.scene_index(), 1);
        assert!(player.is_playing());
        player.run(100);
        assert!(player.is_completed());
        assert_eq!(player.current_time(), 5.0);
    }

    #[test]
    fn test_total_shorter_than_scenes_truncates() {
        let mut player = ScenePlayer::new(vec![5.0, 5.0, 5.0], 7.0);
        player.play();
        let events = player.run(1000);
        assert_eq!(events.last(), Some(&TickEvent::Completed));
        assert_eq!(player.scene_index(), 1);
    }
}
