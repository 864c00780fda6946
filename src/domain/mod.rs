//! Domain entities for devcyclesim.
//!
//! This module contains the core data the engine moves around:
//! - Phase: The four pipeline phases
//! - UserStory / Task: Work items and their one-day units
//! - ResourcePlan / ResourcePlanSchedule: Capacity over time
//! - Statistics: Day snapshots, finished stories and run summaries

mod phase;
mod resource_plan;
mod statistics;
mod story;

pub use phase::Phase;
pub use resource_plan::{Capacities, ResourcePlan, ResourcePlanSchedule};
pub use statistics::{
    DayStatistic, FeatureStatistic, FinishedStory, PhaseSummary, SimulationSummary,
    StepStatistic,
};
pub use story::{
    PhaseDurations, StoryStatus, Task, TaskBlock, TaskCompletionDates, UserStory, DEFAULT_FEATURE,
};
