//! User stories and their one-day tasks.

use super::Phase;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feature label used when a story does not name one
pub const DEFAULT_FEATURE: &str = "default_feature";

/// An indivisible one-day unit of work in a single phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub phase: Phase,
    pub completed: bool,
    pub completed_on_day: Option<u32>,
}

impl Task {
    /// Create an open task for a phase
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            completed: false,
            completed_on_day: None,
        }
    }

    /// Mark the task done on `day`. A completed task keeps its first stamp.
    pub fn complete(&mut self, day: u32) {
        if !self.completed {
            self.completed = true;
            self.completed_on_day = Some(day);
        }
    }
}

/// Lifecycle status of a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    /// Waiting in a backlog or input queue
    #[default]
    Pending,
    /// Active inside a process step
    InProgress,
    /// Finished the tasks of the current phase, waiting to be routed
    PhaseDone,
    /// All tasks completed
    Done,
}

/// Linear per-phase durations for the common "one block per phase" story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub spec: u32,
    pub dev: u32,
    pub test: u32,
    pub rollout: u32,
}

impl PhaseDurations {
    pub fn new(spec: u32, dev: u32, test: u32, rollout: u32) -> Self {
        Self {
            spec,
            dev,
            test,
            rollout,
        }
    }

    /// Duration for a phase
    pub fn get(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Spec => self.spec,
            Phase::Dev => self.dev,
            Phase::Test => self.test,
            Phase::Rollout => self.rollout,
        }
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self::new(2, 3, 3, 1)
    }
}

/// A run of `count` consecutive tasks in one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskBlock {
    pub phase: Phase,
    #[serde(default = "default_block_count")]
    pub count: u32,
}

fn default_block_count() -> u32 {
    1
}

impl TaskBlock {
    pub fn new(phase: Phase, count: u32) -> Self {
        Self { phase, count }
    }

    /// Expand blocks into a flat phase sequence
    pub fn expand(blocks: &[TaskBlock]) -> Vec<Phase> {
        blocks
            .iter()
            .flat_map(|b| std::iter::repeat(b.phase).take(b.count as usize))
            .collect()
    }
}

/// Completed and still open tasks of a story
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskCompletionDates {
    pub completed: Vec<(Phase, u32)>,
    pub pending: Vec<Phase>,
}

/// A unit of work flowing through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    pub id: String,
    pub feature_id: String,
    pub tasks: Vec<Task>,
    pub current_task_index: usize,
    pub arrival_day: u32,
    pub priority: u32,
    pub status: StoryStatus,
    /// Day the last task was completed
    pub completed_on_day: Option<u32>,
    /// Position in the configured story list, breaks arrival-day ties
    #[serde(skip)]
    pub(crate) sequence: usize,
    /// Set while a backward-routed story waits for admission
    #[serde(skip)]
    pub(crate) rework: bool,
    /// Set while a story admitted as rework is active; shields it from
    /// rework preemption
    #[serde(skip)]
    pub(crate) reworking: bool,
    /// Number of rework blocks inserted so far
    pub rework_count: u32,
}

impl UserStory {
    /// Build a story from an explicit ordered list of task phases.
    /// Phases may repeat and appear out of pipeline order.
    pub fn from_tasks(
        id: impl Into<String>,
        phases: impl IntoIterator<Item = Phase>,
    ) -> Result<Self, ConfigurationError> {
        let id = id.into();
        let tasks: Vec<Task> = phases.into_iter().map(Task::new).collect();
        if tasks.is_empty() {
            return Err(ConfigurationError::EmptyTaskList(id));
        }

        Ok(Self {
            id,
            feature_id: DEFAULT_FEATURE.to_string(),
            tasks,
            current_task_index: 0,
            arrival_day: 1,
            priority: 1,
            status: StoryStatus::Pending,
            completed_on_day: None,
            sequence: 0,
            rework: false,
            reworking: false,
            rework_count: 0,
        })
    }

    /// Build a story with one block of tasks per phase in pipeline order
    pub fn from_phase_durations(
        id: impl Into<String>,
        durations: PhaseDurations,
    ) -> Result<Self, ConfigurationError> {
        let id = id.into();
        if let Some(phase) = Phase::ALL.iter().find(|p| durations.get(**p) == 0) {
            return Err(ConfigurationError::InvalidDuration {
                story: id,
                phase: *phase,
            });
        }

        let phases = Phase::ALL
            .iter()
            .flat_map(|p| std::iter::repeat(*p).take(durations.get(*p) as usize));
        Self::from_tasks(id, phases)
    }

    /// Set the arrival day
    pub fn with_arrival_day(mut self, day: u32) -> Self {
        self.arrival_day = day;
        self
    }

    /// Set the priority (1 is the highest)
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the feature label
    pub fn with_feature(mut self, feature_id: impl Into<String>) -> Self {
        self.feature_id = feature_id.into();
        self
    }

    /// Check the attributes that builders cannot enforce
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.tasks.is_empty() {
            return Err(ConfigurationError::EmptyTaskList(self.id.clone()));
        }
        if self.arrival_day == 0 {
            return Err(ConfigurationError::InvalidArrivalDay(self.id.clone()));
        }
        if self.priority == 0 {
            return Err(ConfigurationError::InvalidPriority(self.id.clone()));
        }
        Ok(())
    }

    /// The task the story works on next
    pub fn current_task(&self) -> Option<&Task> {
        self.tasks.get(self.current_task_index)
    }

    /// Phase of the next task, `None` once all tasks are done
    pub fn current_phase(&self) -> Option<Phase> {
        self.current_task().map(|t| t.phase)
    }

    /// Whether every task is completed
    pub fn is_done(&self) -> bool {
        self.current_task_index >= self.tasks.len()
    }

    /// Whether the story waits for priority admission after a backward hop
    pub fn is_rework(&self) -> bool {
        self.rework
    }

    /// Complete the current task on `day` and move the cursor forward.
    /// Returns the phase of the task that was completed.
    pub fn complete_current_task(&mut self, day: u32) -> Option<Phase> {
        let task = self.tasks.get_mut(self.current_task_index)?;
        task.complete(day);
        let phase = task.phase;
        self.current_task_index += 1;
        if self.is_done() {
            self.completed_on_day = Some(day);
        }
        Some(phase)
    }

    /// Completed tasks in the current run of same-phase tasks.
    /// Used to decide which active story loses least when evicted.
    pub fn phase_progress(&self) -> usize {
        let Some(phase) = self.current_phase() else {
            return 0;
        };
        self.tasks[..self.current_task_index]
            .iter()
            .rev()
            .take_while(|t| t.phase == phase)
            .count()
    }

    /// Insert fresh tasks at the cursor so they are worked on next.
    /// Completed tasks are never touched.
    pub fn insert_tasks(&mut self, phases: impl IntoIterator<Item = Phase>) {
        let at = self.current_task_index;
        let new_tasks: Vec<Task> = phases.into_iter().map(Task::new).collect();
        if new_tasks.is_empty() {
            return;
        }
        self.tasks.splice(at..at, new_tasks);
        self.completed_on_day = None;
    }

    /// Number of tasks in the story
    pub fn total_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Number of completed tasks
    pub fn completed_tasks(&self) -> usize {
        self.current_task_index
    }

    /// Completed task count per phase
    pub fn completed_work(&self) -> BTreeMap<Phase, usize> {
        let mut work: BTreeMap<Phase, usize> = Phase::ALL.iter().map(|p| (*p, 0)).collect();
        for task in self.tasks.iter().filter(|t| t.completed) {
            *work.entry(task.phase).or_default() += 1;
        }
        work
    }

    /// Completion day of every finished task and the phases still open
    pub fn task_completion_dates(&self) -> TaskCompletionDates {
        let mut dates = TaskCompletionDates::default();
        for task in &self.tasks {
            match task.completed_on_day {
                Some(day) if task.completed => dates.completed.push((task.phase, day)),
                _ => dates.pending.push(task.phase),
            }
        }
        dates
    }

    /// Days from arrival to completion, counting both ends
    pub fn lead_time(&self) -> Option<u32> {
        self.completed_on_day
            .map(|done| done.saturating_sub(self.arrival_day) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story() -> UserStory {
        UserStory::from_phase_durations("STORY-1", PhaseDurations::new(2, 3, 3, 1)).unwrap()
    }

    #[test]
    fn test_from_phase_durations() {
        let story = story();
        assert_eq!(story.total_tasks(), 9);
        assert_eq!(story.current_phase(), Some(Phase::Spec));
        assert_eq!(story.status, StoryStatus::Pending);
        assert_eq!(story.feature_id, DEFAULT_FEATURE);
        assert_eq!(story.tasks[2].phase, Phase::Dev);
        assert_eq!(story.tasks[8].phase, Phase::Rollout);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let err = UserStory::from_phase_durations("S", PhaseDurations::new(1, 0, 1, 1)).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidDuration {
                story: "S".to_string(),
                phase: Phase::Dev
            }
        );
    }

    #[test]
    fn test_empty_task_list_rejected() {
        let err = UserStory::from_tasks("S", Vec::new()).unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyTaskList("S".to_string()));
    }

    #[test]
    fn test_validate() {
        assert!(story().validate().is_ok());
        assert!(story().with_arrival_day(0).validate().is_err());
        assert!(story().with_priority(0).validate().is_err());
    }

    #[test]
    fn test_task_progression() {
        let mut story = story();
        assert_eq!(story.complete_current_task(1), Some(Phase::Spec));
        assert_eq!(story.phase_progress(), 1);
        assert_eq!(story.complete_current_task(2), Some(Phase::Spec));
        assert_eq!(story.current_phase(), Some(Phase::Dev));
        assert_eq!(story.phase_progress(), 0);

        let work = story.completed_work();
        assert_eq!(work[&Phase::Spec], 2);
        assert_eq!(work[&Phase::Dev], 0);
        assert_eq!(story.tasks[0].completed_on_day, Some(1));
        assert_eq!(story.tasks[1].completed_on_day, Some(2));
    }

    #[test]
    fn test_completed_task_keeps_first_stamp() {
        let mut task = Task::new(Phase::Test);
        task.complete(4);
        task.complete(9);
        assert!(task.completed);
        assert_eq!(task.completed_on_day, Some(4));
    }

    #[test]
    fn test_done_and_lead_time() {
        let mut story = UserStory::from_tasks("S", [Phase::Spec, Phase::Rollout])
            .unwrap()
            .with_arrival_day(3);
        story.complete_current_task(4);
        assert!(!story.is_done());
        assert_eq!(story.lead_time(), None);
        story.complete_current_task(6);
        assert!(story.is_done());
        assert_eq!(story.current_phase(), None);
        assert_eq!(story.lead_time(), Some(4));
        assert_eq!(story.complete_current_task(7), None);
    }

    #[test]
    fn test_insert_tasks_at_cursor() {
        let mut story = UserStory::from_tasks("S", [Phase::Dev, Phase::Test, Phase::Rollout]).unwrap();
        story.complete_current_task(1);
        story.complete_current_task(2);
        story.insert_tasks([Phase::Dev, Phase::Test]);

        assert_eq!(story.total_tasks(), 5);
        assert_eq!(story.current_task_index, 2);
        assert_eq!(story.current_phase(), Some(Phase::Dev));
        assert!(story.tasks[0].completed && story.tasks[1].completed);
        assert!(!story.tasks[2].completed);
        assert_eq!(story.tasks[4].phase, Phase::Rollout);
    }

    #[test]
    fn test_task_blocks_expand() {
        let phases = TaskBlock::expand(&[
            TaskBlock::new(Phase::Spec, 2),
            TaskBlock::new(Phase::Dev, 1),
            TaskBlock::new(Phase::Spec, 1),
        ]);
        assert_eq!(phases, vec![Phase::Spec, Phase::Spec, Phase::Dev, Phase::Spec]);

        let block: TaskBlock = serde_json::from_str(r#"{"phase": "test"}"#).unwrap();
        assert_eq!(block, TaskBlock::new(Phase::Test, 1));
    }

    #[test]
    fn test_task_completion_dates() {
        let mut story = UserStory::from_tasks("S", [Phase::Spec, Phase::Dev]).unwrap();
        story.complete_current_task(5);
        let dates = story.task_completion_dates();
        assert_eq!(dates.completed, vec![(Phase::Spec, 5)]);
        assert_eq!(dates.pending, vec![Phase::Dev]);
    }
}
