//! Day-loop orchestration across the four chained process steps.

use super::process_step::{ProcessStep, StepDayOutcome};
use super::rework::ReworkModel;
use crate::domain::{
    DayStatistic, FeatureStatistic, FinishedStory, Phase, ResourcePlanSchedule,
    SimulationSummary, StepStatistic, StoryStatus, UserStory,
};
use crate::error::{ConfigurationError, InvariantViolation, SimResult};
use std::collections::{BTreeMap, HashSet, VecDeque};

/// Lifecycle of a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    NotStarted,
    Running,
    Finished,
}

/// The top-level simulation: backlog, pipeline, finished work and statistics.
///
/// All state is owned here, so independent processes can run side by side.
#[derive(Debug, Clone)]
pub struct Process {
    simulation_days: u32,
    current_day: u32,
    state: RunState,
    backlog: VecDeque<UserStory>,
    finished_work: Vec<UserStory>,
    statistics: Vec<DayStatistic>,
    schedule: ResourcePlanSchedule,
    steps: [ProcessStep; 4],
    rework: ReworkModel,
    story_ids: HashSet<String>,
    tasks_completed_total: usize,
}

impl Process {
    /// Create a process that runs for `simulation_days` under `schedule`
    pub fn new(simulation_days: u32, schedule: ResourcePlanSchedule) -> Self {
        Self {
            simulation_days,
            current_day: 0,
            state: RunState::NotStarted,
            backlog: VecDeque::new(),
            finished_work: Vec::new(),
            statistics: Vec::new(),
            schedule,
            steps: Phase::ALL.map(ProcessStep::new),
            rework: ReworkModel::none(),
            story_ids: HashSet::new(),
            tasks_completed_total: 0,
        }
    }

    /// Use a rework model for error-rate driven backward routing
    pub fn with_rework(mut self, rework: ReworkModel) -> Self {
        self.rework = rework;
        self
    }

    /// Add a story to the backlog. The backlog stays ordered by arrival day;
    /// stories arriving on the same day keep the order they were added in.
    pub fn add(&mut self, mut story: UserStory) -> Result<(), ConfigurationError> {
        if self.state != RunState::NotStarted {
            return Err(ConfigurationError::AlreadyStarted);
        }
        story.validate()?;
        if !self.story_ids.insert(story.id.clone()) {
            return Err(ConfigurationError::DuplicateStoryId(story.id));
        }

        story.sequence = self.story_ids.len() - 1;
        story.status = StoryStatus::Pending;
        let at = self
            .backlog
            .partition_point(|s| s.arrival_day <= story.arrival_day);
        self.backlog.insert(at, story);
        Ok(())
    }

    /// Add several stories in order
    pub fn add_all(
        &mut self,
        stories: impl IntoIterator<Item = UserStory>,
    ) -> Result<(), ConfigurationError> {
        stories.into_iter().try_for_each(|s| self.add(s))
    }

    /// Run every remaining day. A finished process is left unchanged.
    pub fn run(&mut self) -> SimResult<()> {
        if self.state == RunState::NotStarted {
            tracing::info!(
                days = self.simulation_days,
                stories = self.total_stories(),
                plans = self.schedule.plans().len(),
                "starting simulation"
            );
        }

        while self.step_day()?.is_some() {}

        tracing::info!(
            finished = self.finished_work.len(),
            tasks = self.tasks_completed_total,
            "simulation finished"
        );
        Ok(())
    }

    /// Simulate the next day and return its snapshot, or `None` once the
    /// configured duration has elapsed.
    pub fn step_day(&mut self) -> SimResult<Option<&DayStatistic>> {
        if self.current_day >= self.simulation_days {
            self.state = RunState::Finished;
            return Ok(None);
        }

        self.state = RunState::Running;
        self.current_day += 1;
        let day = self.current_day;

        self.release_arrivals(day);

        for step in self.steps.iter_mut() {
            let capacity = self.schedule.capacity_for(step.phase(), day);
            step.start_of_day(day, capacity);
        }

        let outcomes: Vec<StepDayOutcome> =
            self.steps.iter_mut().map(|s| s.process_day(day)).collect();
        self.tasks_completed_total += outcomes.iter().map(|o| o.tasks_completed).sum::<usize>();

        self.route_completed(day);
        self.record_statistics(day, &outcomes);
        self.check_invariants(day)?;

        if day == self.simulation_days {
            self.state = RunState::Finished;
        }
        Ok(self.statistics.last())
    }

    /// Move stories arriving today from the backlog into the pipeline
    fn release_arrivals(&mut self, day: u32) {
        while self.backlog.front().is_some_and(|s| s.arrival_day <= day) {
            let Some(story) = self.backlog.pop_front() else {
                break;
            };
            // Stories normally start in spec; explicit task lists may not
            let phase = story.current_phase().unwrap_or(Phase::Spec);
            tracing::debug!(day, story = %story.id, %phase, "arrived");
            self.steps[phase.index()].enqueue(story);
        }
    }

    /// Drain every done queue and hand each story to its next step.
    /// Backward hops go to the front of the target queue.
    fn route_completed(&mut self, day: u32) {
        for idx in 0..self.steps.len() {
            let from = self.steps[idx].phase();

            for mut story in self.steps[idx].drain_done() {
                if !self.rework.is_empty() && self.rework.apply(&mut story, from) {
                    tracing::debug!(day, story = %story.id, after = %from, "rework inserted");
                }

                match story.current_phase() {
                    None => {
                        story.status = StoryStatus::Done;
                        tracing::debug!(
                            day,
                            story = %story.id,
                            lead_time = story.lead_time(),
                            "finished"
                        );
                        self.finished_work.push(story);
                    }
                    Some(next) if next < from => {
                        tracing::debug!(day, story = %story.id, from = %from, to = %next, "routed back");
                        self.steps[next.index()].enqueue_rework(story);
                    }
                    Some(next) => self.steps[next.index()].enqueue(story),
                }
            }
        }
    }

    fn record_statistics(&mut self, day: u32, outcomes: &[StepDayOutcome]) {
        let steps = self
            .steps
            .iter()
            .zip(outcomes)
            .map(|(step, outcome)| StepStatistic {
                phase: step.phase(),
                capacity: step.capacity(),
                input_queue_count: step.count_input_queue(),
                active_count: step.count_active(),
                done_today: outcome.phase_completed,
                tasks_completed_today: outcome.tasks_completed,
            })
            .collect();

        self.statistics.push(DayStatistic {
            day,
            backlog_count: self.backlog.len(),
            finished_count: self.finished_work.len(),
            steps,
            tasks_completed_today: outcomes.iter().map(|o| o.tasks_completed).sum(),
            tasks_completed_total: self.tasks_completed_total,
            features: self.feature_statistics(),
        });
    }

    fn feature_statistics(&self) -> BTreeMap<String, FeatureStatistic> {
        fn entry<'a>(
            features: &'a mut BTreeMap<String, FeatureStatistic>,
            story: &UserStory,
        ) -> &'a mut FeatureStatistic {
            features.entry(story.feature_id.clone()).or_default()
        }

        let mut features = BTreeMap::new();
        for story in &self.backlog {
            entry(&mut features, story).backlog += 1;
        }
        for step in &self.steps {
            for story in step.input_queue().chain(step.done()) {
                entry(&mut features, story).queued += 1;
            }
            for story in step.active() {
                entry(&mut features, story).active += 1;
            }
        }
        for story in &self.finished_work {
            entry(&mut features, story).finished += 1;
        }
        features
    }

    /// Story conservation and the capacity bound; a failure is an engine bug
    fn check_invariants(&self, day: u32) -> Result<(), InvariantViolation> {
        let held = self.backlog.len()
            + self.steps.iter().map(|s| s.story_count()).sum::<usize>()
            + self.finished_work.len();
        if held != self.total_stories() {
            return Err(InvariantViolation {
                day,
                message: format!(
                    "story conservation broken: {} configured, {} held",
                    self.total_stories(),
                    held
                ),
            });
        }

        if let Some(step) = self
            .steps
            .iter()
            .find(|s| s.count_active() > s.capacity() as usize)
        {
            return Err(InvariantViolation {
                day,
                message: format!(
                    "{} has {} active stories but capacity {}",
                    step.phase(),
                    step.count_active(),
                    step.capacity()
                ),
            });
        }
        Ok(())
    }

    pub fn simulation_days(&self) -> u32 {
        self.simulation_days
    }

    /// The last simulated day, 0 before the first
    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn total_stories(&self) -> usize {
        self.story_ids.len()
    }

    pub fn schedule(&self) -> &ResourcePlanSchedule {
        &self.schedule
    }

    /// The step for a phase
    pub fn step(&self, phase: Phase) -> &ProcessStep {
        &self.steps[phase.index()]
    }

    pub fn steps(&self) -> &[ProcessStep] {
        &self.steps
    }

    pub fn backlog(&self) -> impl Iterator<Item = &UserStory> {
        self.backlog.iter()
    }

    /// Completed stories in completion order
    pub fn finished_work(&self) -> &[UserStory] {
        &self.finished_work
    }

    /// One snapshot per simulated day
    pub fn statistics(&self) -> &[DayStatistic] {
        &self.statistics
    }

    /// Report view of the finished stories
    pub fn finished_stories(&self) -> Vec<FinishedStory> {
        self.finished_work
            .iter()
            .filter_map(FinishedStory::from_story)
            .collect()
    }

    /// Every story the process holds, wherever it currently is
    pub fn all_stories(&self) -> impl Iterator<Item = &UserStory> {
        self.backlog
            .iter()
            .chain(
                self.steps
                    .iter()
                    .flat_map(|s| s.input_queue().chain(s.active()).chain(s.done())),
            )
            .chain(self.finished_work.iter())
    }

    /// Aggregate lead time, throughput and WIP figures
    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary::from_run(
            self.total_stories(),
            &self.statistics,
            &self.finished_stories(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Capacities, PhaseDurations};

    fn story(id: &str, durations: (u32, u32, u32, u32)) -> UserStory {
        UserStory::from_phase_durations(
            id,
            PhaseDurations::new(durations.0, durations.1, durations.2, durations.3),
        )
        .unwrap()
    }

    #[test]
    fn test_sunny_path() {
        let mut process = Process::new(7, ResourcePlanSchedule::default());
        process.add(story("STORY-1", (1, 2, 1, 1))).unwrap();
        process.add(story("STORY-2", (2, 1, 1, 1))).unwrap();
        process.add(story("STORY-3", (1, 1, 2, 1))).unwrap();

        // Day 1: spec works on 1 and 2, story 1 moves on to dev
        let day1 = process.step_day().unwrap().unwrap().clone();
        assert_eq!(day1.backlog_count, 0);
        assert_eq!(day1.step(Phase::Spec).active_count, 1);
        assert_eq!(day1.step(Phase::Spec).input_queue_count, 1);
        assert_eq!(day1.step(Phase::Spec).done_today, 1);
        assert_eq!(day1.step(Phase::Dev).input_queue_count, 1);

        process.run().unwrap();
        assert_eq!(process.state(), RunState::Finished);
        assert_eq!(process.statistics().len(), 7);

        let finished: Vec<&str> = process.finished_work().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(finished, vec!["STORY-1", "STORY-2", "STORY-3"]);
        assert!(process
            .finished_work()
            .iter()
            .all(|s| s.status == StoryStatus::Done));
        // Story 1: spec 1, dev 2-3, test 4, rollout 5
        assert_eq!(process.finished_work()[0].completed_on_day, Some(5));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut process = Process::new(1, ResourcePlanSchedule::default());
        process.add(story("A", (1, 1, 1, 1))).unwrap();
        assert_eq!(
            process.add(story("A", (1, 1, 1, 1))),
            Err(ConfigurationError::DuplicateStoryId("A".to_string()))
        );
        assert_eq!(process.total_stories(), 1);
    }

    #[test]
    fn test_add_after_start_rejected() {
        let mut process = Process::new(2, ResourcePlanSchedule::default());
        process.step_day().unwrap();
        assert_eq!(
            process.add(story("late", (1, 1, 1, 1))),
            Err(ConfigurationError::AlreadyStarted)
        );
    }

    #[test]
    fn test_backlog_ordered_by_arrival() {
        let mut process = Process::new(1, ResourcePlanSchedule::default());
        process.add(story("late", (1, 1, 1, 1)).with_arrival_day(3)).unwrap();
        process.add(story("early-a", (1, 1, 1, 1))).unwrap();
        process.add(story("early-b", (1, 1, 1, 1))).unwrap();
        let order: Vec<&str> = process.backlog().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["early-a", "early-b", "late"]);
    }

    #[test]
    fn test_story_arriving_after_run_stays_in_backlog() {
        let mut process = Process::new(3, ResourcePlanSchedule::default());
        process.add(story("far", (1, 1, 1, 1)).with_arrival_day(10)).unwrap();
        process.run().unwrap();
        assert_eq!(process.statistics().last().unwrap().backlog_count, 1);
        assert!(process.finished_work().is_empty());
    }

    #[test]
    fn test_run_twice_is_noop() {
        let mut process = Process::new(3, ResourcePlanSchedule::default());
        process.add(story("S", (1, 1, 1, 1))).unwrap();
        process.run().unwrap();
        process.run().unwrap();
        assert_eq!(process.statistics().len(), 3);
        assert!(process.step_day().unwrap().is_none());
    }

    #[test]
    fn test_story_starting_outside_spec() {
        let mut process = Process::new(2, ResourcePlanSchedule::default());
        process
            .add(UserStory::from_tasks("hotfix", [Phase::Rollout]).unwrap())
            .unwrap();
        process.run().unwrap();
        assert_eq!(process.finished_work()[0].completed_on_day, Some(1));
        assert_eq!(process.statistics()[0].step(Phase::Rollout).tasks_completed_today, 1);
    }

    #[test]
    fn test_feature_statistics() {
        let mut process = Process::new(1, ResourcePlanSchedule::constant(Capacities::new(1, 1, 1, 1)));
        process.add(story("A1", (2, 1, 1, 1)).with_feature("Feature-A")).unwrap();
        process.add(story("B1", (1, 1, 1, 1)).with_feature("Feature-B")).unwrap();
        process
            .add(story("B2", (1, 1, 1, 1)).with_feature("Feature-B").with_arrival_day(5))
            .unwrap();
        process.run().unwrap();

        let features = &process.statistics()[0].features;
        assert_eq!(features["Feature-A"].active, 1);
        assert_eq!(features["Feature-B"].queued, 1);
        assert_eq!(features["Feature-B"].backlog, 1);
        assert_eq!(features["Feature-B"].total(), 2);
    }
}
