//! Per-day snapshots and run summaries produced by the engine.

use super::{Phase, TaskCompletionDates, UserStory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State of one process step at the end of a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatistic {
    pub phase: Phase,
    pub capacity: u32,
    pub input_queue_count: usize,
    pub active_count: usize,
    /// Stories that finished their run of tasks in this phase today
    pub done_today: usize,
    pub tasks_completed_today: usize,
}

impl StepStatistic {
    /// Active stories as a share of capacity, `None` when the phase is gated
    pub fn utilization(&self) -> Option<f64> {
        (self.capacity > 0).then(|| self.active_count as f64 / self.capacity as f64)
    }
}

/// Where the stories of one feature are at the end of a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureStatistic {
    pub backlog: usize,
    pub queued: usize,
    pub active: usize,
    pub finished: usize,
}

impl FeatureStatistic {
    pub fn total(&self) -> usize {
        self.backlog + self.queued + self.active + self.finished
    }
}

/// Snapshot of the whole process after a simulated day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStatistic {
    pub day: u32,
    pub backlog_count: usize,
    pub finished_count: usize,
    /// One entry per phase in pipeline order
    pub steps: Vec<StepStatistic>,
    pub tasks_completed_today: usize,
    /// Cumulative completed tasks up to and including this day
    pub tasks_completed_total: usize,
    pub features: BTreeMap<String, FeatureStatistic>,
}

impl DayStatistic {
    /// Statistic for one phase
    pub fn step(&self, phase: Phase) -> &StepStatistic {
        &self.steps[phase.index()]
    }

    /// Stories anywhere between arrival and completion
    pub fn work_in_process(&self) -> usize {
        self.steps.iter().map(|s| s.input_queue_count + s.active_count).sum()
    }
}

/// A story that made it through rollout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedStory {
    pub id: String,
    pub feature_id: String,
    pub arrival_day: u32,
    pub completion_day: u32,
    pub lead_time: u32,
    pub total_tasks: usize,
    pub rework_count: u32,
    pub completion_dates: TaskCompletionDates,
}

impl FinishedStory {
    /// Extract the report view of a finished story
    pub fn from_story(story: &UserStory) -> Option<Self> {
        let completion_day = story.completed_on_day?;
        Some(Self {
            id: story.id.clone(),
            feature_id: story.feature_id.clone(),
            arrival_day: story.arrival_day,
            completion_day,
            lead_time: story.lead_time().unwrap_or_default(),
            total_tasks: story.total_tasks(),
            rework_count: story.rework_count,
            completion_dates: story.task_completion_dates(),
        })
    }
}

/// Per-phase aggregates over a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub tasks_completed: usize,
    pub mean_active: f64,
    pub mean_queue: f64,
    /// Mean active/capacity over the days the phase had capacity
    pub utilization: Option<f64>,
}

/// Aggregate view of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub simulated_days: u32,
    pub total_stories: usize,
    pub finished_stories: usize,
    pub tasks_completed: usize,
    pub total_lead_time: u64,
    pub mean_lead_time: Option<f64>,
    pub max_lead_time: Option<u32>,
    pub throughput_per_day: f64,
    pub mean_work_in_process: f64,
    pub phases: Vec<PhaseSummary>,
}

impl SimulationSummary {
    /// Summarise statistics and finished stories of a run
    pub fn from_run(
        total_stories: usize,
        statistics: &[DayStatistic],
        finished: &[FinishedStory],
    ) -> Self {
        let days = statistics.len();
        let mean = |sum: usize| {
            if days == 0 {
                0.0
            } else {
                sum as f64 / days as f64
            }
        };

        let total_lead_time: u64 = finished.iter().map(|s| u64::from(s.lead_time)).sum();
        let mean_lead_time =
            (!finished.is_empty()).then(|| total_lead_time as f64 / finished.len() as f64);

        let phases = Phase::ALL
            .iter()
            .map(|phase| {
                let steps: Vec<&StepStatistic> = statistics.iter().map(|d| d.step(*phase)).collect();
                let utilizations: Vec<f64> = steps.iter().filter_map(|s| s.utilization()).collect();
                PhaseSummary {
                    phase: *phase,
                    tasks_completed: steps.iter().map(|s| s.tasks_completed_today).sum(),
                    mean_active: mean(steps.iter().map(|s| s.active_count).sum()),
                    mean_queue: mean(steps.iter().map(|s| s.input_queue_count).sum()),
                    utilization: (!utilizations.is_empty())
                        .then(|| utilizations.iter().sum::<f64>() / utilizations.len() as f64),
                }
            })
            .collect();

        Self {
            simulated_days: statistics.last().map(|d| d.day).unwrap_or(0),
            total_stories,
            finished_stories: finished.len(),
            tasks_completed: statistics.last().map(|d| d.tasks_completed_total).unwrap_or(0),
            total_lead_time,
            mean_lead_time,
            max_lead_time: finished.iter().map(|s| s.lead_time).max(),
            throughput_per_day: mean(finished.len()),
            mean_work_in_process: mean(statistics.iter().map(|d| d.work_in_process()).sum()),
            phases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(phase: Phase, capacity: u32, active: usize) -> StepStatistic {
        StepStatistic {
            phase,
            capacity,
            input_queue_count: 1,
            active_count: active,
            done_today: 0,
            tasks_completed_today: active,
        }
    }

    fn day(day: u32, total: usize) -> DayStatistic {
        DayStatistic {
            day,
            backlog_count: 0,
            finished_count: 0,
            steps: vec![
                step(Phase::Spec, 2, 2),
                step(Phase::Dev, 3, 0),
                step(Phase::Test, 0, 0),
                step(Phase::Rollout, 1, 1),
            ],
            tasks_completed_today: 3,
            tasks_completed_total: total,
            features: BTreeMap::new(),
        }
    }

    #[test]
    fn test_utilization() {
        assert_eq!(step(Phase::Spec, 2, 1).utilization(), Some(0.5));
        assert_eq!(step(Phase::Spec, 0, 0).utilization(), None);
    }

    #[test]
    fn test_summary() {
        let stats = vec![day(1, 3), day(2, 6)];
        let finished = vec![FinishedStory {
            id: "S".to_string(),
            feature_id: "F".to_string(),
            arrival_day: 1,
            completion_day: 2,
            lead_time: 2,
            total_tasks: 2,
            rework_count: 0,
            completion_dates: TaskCompletionDates::default(),
        }];

        let summary = SimulationSummary::from_run(4, &stats, &finished);
        assert_eq!(summary.simulated_days, 2);
        assert_eq!(summary.tasks_completed, 6);
        assert_eq!(summary.mean_lead_time, Some(2.0));
        assert_eq!(summary.max_lead_time, Some(2));
        assert_eq!(summary.throughput_per_day, 0.5);
        assert_eq!(summary.mean_work_in_process, 7.0);

        let spec = &summary.phases[0];
        assert_eq!(spec.tasks_completed, 4);
        assert_eq!(spec.utilization, Some(1.0));
        assert_eq!(summary.phases[2].utilization, None);
    }

    #[test]
    fn test_summary_of_empty_run() {
        let summary = SimulationSummary::from_run(0, &[], &[]);
        assert_eq!(summary.simulated_days, 0);
        assert_eq!(summary.mean_lead_time, None);
        assert_eq!(summary.throughput_per_day, 0.0);
    }
}
