//! The per-phase machine: input queue, capacity-bounded active set, done queue.

use crate::domain::{Phase, StoryStatus, UserStory};
use std::cmp::Reverse;
use std::collections::VecDeque;

/// What a step accomplished during one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepDayOutcome {
    pub tasks_completed: usize,
    pub phase_completed: usize,
}

/// One phase of the pipeline.
///
/// Stories move QUEUED → ACTIVE → PHASE_COMPLETE inside a step. The step owns
/// every story it holds; stories enter and leave only by value.
#[derive(Debug, Clone)]
pub struct ProcessStep {
    phase: Phase,
    input_queue: VecDeque<UserStory>,
    active: Vec<UserStory>,
    done: Vec<UserStory>,
    capacity: u32,
}

impl ProcessStep {
    /// Create an empty step for a phase
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            input_queue: VecDeque::new(),
            active: Vec::new(),
            done: Vec::new(),
            capacity: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Capacity applied at the last start of day
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Append a story to the back of the input queue
    pub fn enqueue(&mut self, mut story: UserStory) {
        story.status = StoryStatus::Pending;
        self.input_queue.push_back(story);
    }

    /// Put a story sent back from a later phase at the front of the queue
    pub fn enqueue_rework(&mut self, mut story: UserStory) {
        story.status = StoryStatus::Pending;
        story.rework = true;
        self.input_queue.push_front(story);
    }

    /// Adjust the active set to the day's capacity.
    ///
    /// Evicts when capacity shrank or when waiting rework needs room, then
    /// admits from the front of the input queue.
    pub fn start_of_day(&mut self, day: u32, capacity: u32) {
        self.capacity = capacity;
        let capacity = capacity as usize;
        let mut evicted = Vec::new();

        while self.active.len() > capacity {
            match self.take_eviction_victim(true) {
                Some(story) => evicted.push(story),
                None => break,
            }
        }

        // Rework stories always form a prefix of the input queue
        let waiting_rework = self.input_queue.iter().take_while(|s| s.rework).count();
        let free = capacity.saturating_sub(self.active.len());
        for _ in 0..waiting_rework.saturating_sub(free) {
            match self.take_eviction_victim(false) {
                Some(story) => evicted.push(story),
                None => break,
            }
        }

        // The last victim has the most progress and lands first in line
        for mut story in evicted {
            tracing::debug!(
                day,
                phase = %self.phase,
                story = %story.id,
                progress = story.phase_progress(),
                "evicted to input queue"
            );
            story.status = StoryStatus::Pending;
            story.reworking = false;
            self.input_queue.insert(waiting_rework, story);
        }

        while self.active.len() < capacity {
            let Some(mut story) = self.input_queue.pop_front() else {
                break;
            };
            debug_assert_eq!(story.current_phase(), Some(self.phase));
            if story.rework {
                tracing::debug!(day, phase = %self.phase, story = %story.id, "admitted rework");
            }
            story.reworking = story.rework;
            story.rework = false;
            story.status = StoryStatus::InProgress;
            self.active.push(story);
        }
    }

    /// Pick the active story that loses least by being sent back: least
    /// progress in the current phase, then the latest arrival. Rework in
    /// progress is only a candidate when `include_rework` is set.
    fn take_eviction_victim(&mut self, include_rework: bool) -> Option<UserStory> {
        let idx = self
            .active
            .iter()
            .enumerate()
            .filter(|(_, s)| include_rework || !s.reworking)
            .min_by_key(|(_, s)| (s.phase_progress(), Reverse((s.arrival_day, s.sequence))))
            .map(|(idx, _)| idx)?;
        Some(self.active.remove(idx))
    }

    /// Work one day: every active story completes exactly one task.
    /// Stories that leave this phase move to the done queue.
    pub fn process_day(&mut self, day: u32) -> StepDayOutcome {
        let mut outcome = StepDayOutcome::default();
        let active = std::mem::take(&mut self.active);

        for mut story in active {
            if story.complete_current_task(day).is_some() {
                outcome.tasks_completed += 1;
            }

            match story.current_phase() {
                Some(phase) if phase == self.phase => self.active.push(story),
                next => {
                    story.reworking = false;
                    story.status = if next.is_none() {
                        StoryStatus::Done
                    } else {
                        StoryStatus::PhaseDone
                    };
                    outcome.phase_completed += 1;
                    self.done.push(story);
                }
            }
        }

        outcome
    }

    /// Hand over all phase-complete stories
    pub fn drain_done(&mut self) -> Vec<UserStory> {
        std::mem::take(&mut self.done)
    }

    pub fn input_queue(&self) -> impl Iterator<Item = &UserStory> {
        self.input_queue.iter()
    }

    pub fn active(&self) -> impl Iterator<Item = &UserStory> {
        self.active.iter()
    }

    pub fn done(&self) -> impl Iterator<Item = &UserStory> {
        self.done.iter()
    }

    pub fn count_input_queue(&self) -> usize {
        self.input_queue.len()
    }

    pub fn count_active(&self) -> usize {
        self.active.len()
    }

    pub fn count_done(&self) -> usize {
        self.done.len()
    }

    /// Stories held in any of the three containers
    pub fn story_count(&self) -> usize {
        self.input_queue.len() + self.active.len() + self.done.len()
    }
}
