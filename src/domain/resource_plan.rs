//! Time-windowed capacity plans.

use super::Phase;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Number of stories each phase can work on simultaneously
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacities {
    pub spec: u32,
    pub dev: u32,
    pub test: u32,
    pub rollout: u32,
}

impl Capacities {
    pub fn new(spec: u32, dev: u32, test: u32, rollout: u32) -> Self {
        Self {
            spec,
            dev,
            test,
            rollout,
        }
    }

    /// Capacity of a single phase
    pub fn get(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Spec => self.spec,
            Phase::Dev => self.dev,
            Phase::Test => self.test,
            Phase::Rollout => self.rollout,
        }
    }
}

impl Default for Capacities {
    fn default() -> Self {
        Self::new(2, 3, 3, 1)
    }
}

impl std::fmt::Display for Capacities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.spec, self.dev, self.test, self.rollout)
    }
}

/// Capacities that apply for a closed, 1-based day interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePlan {
    pub start_day: u32,
    pub end_day: u32,
    pub capacities: Capacities,
}

impl ResourcePlan {
    /// Create a plan, rejecting empty or zero-based intervals
    pub fn new(
        start_day: u32,
        end_day: u32,
        capacities: Capacities,
    ) -> Result<Self, ConfigurationError> {
        if start_day == 0 || start_day > end_day {
            return Err(ConfigurationError::InvalidPlanInterval {
                start: start_day,
                end: end_day,
            });
        }
        Ok(Self {
            start_day,
            end_day,
            capacities,
        })
    }

    /// Whether the plan covers `day`
    pub fn contains(&self, day: u32) -> bool {
        self.start_day <= day && day <= self.end_day
    }

    /// Whether two plans share at least one day
    pub fn overlaps(&self, other: &ResourcePlan) -> bool {
        self.start_day <= other.end_day && other.start_day <= self.end_day
    }
}

impl std::fmt::Display for ResourcePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}:{}", self.start_day, self.end_day, self.capacities)
    }
}

/// Non-overlapping plans, ordered by start day, with a fallback capacity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourcePlanSchedule {
    plans: Vec<ResourcePlan>,
    default: Capacities,
}

impl ResourcePlanSchedule {
    /// Build a schedule; fails if any two intervals intersect
    pub fn new(
        mut plans: Vec<ResourcePlan>,
        default: Capacities,
    ) -> Result<Self, ConfigurationError> {
        plans.sort_by_key(|p| (p.start_day, p.end_day));

        // After sorting, any overlap shows up between neighbours
        for pair in plans.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(ConfigurationError::OverlappingPlans {
                    first_start: pair[0].start_day,
                    first_end: pair[0].end_day,
                    second_start: pair[1].start_day,
                    second_end: pair[1].end_day,
                });
            }
        }

        Ok(Self { plans, default })
    }

    /// A schedule that always answers with the given capacities
    pub fn constant(default: Capacities) -> Self {
        Self {
            plans: Vec::new(),
            default,
        }
    }

    /// The plan covering `day`, if any
    pub fn plan_for(&self, day: u32) -> Option<&ResourcePlan> {
        let idx = self.plans.partition_point(|p| p.end_day < day);
        self.plans.get(idx).filter(|p| p.contains(day))
    }

    /// All capacities in effect on `day`
    pub fn capacities_for(&self, day: u32) -> Capacities {
        self.plan_for(day).map(|p| p.capacities).unwrap_or(self.default)
    }

    /// Capacity of `phase` on `day`
    pub fn capacity_for(&self, phase: Phase, day: u32) -> u32 {
        self.capacities_for(day).get(phase)
    }

    /// The plans in start-day order
    pub fn plans(&self) -> &[ResourcePlan] {
        &self.plans
    }
}

impl Default for ResourcePlanSchedule {
    fn default() -> Self {
        Self::constant(Capacities::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(start: u32, end: u32, caps: (u32, u32, u32, u32)) -> ResourcePlan {
        ResourcePlan::new(start, end, Capacities::new(caps.0, caps.1, caps.2, caps.3)).unwrap()
    }

    #[test]
    fn test_invalid_interval() {
        assert!(ResourcePlan::new(5, 4, Capacities::default()).is_err());
        assert!(ResourcePlan::new(0, 4, Capacities::default()).is_err());
        assert!(ResourcePlan::new(4, 4, Capacities::default()).is_ok());
    }

    #[test]
    fn test_capacity_lookup() {
        let schedule = ResourcePlanSchedule::new(
            vec![plan(11, 20, (1, 1, 1, 1)), plan(1, 10, (2, 3, 0, 0))],
            Capacities::new(9, 9, 9, 9),
        )
        .unwrap();

        assert_eq!(schedule.capacity_for(Phase::Dev, 1), 3);
        assert_eq!(schedule.capacity_for(Phase::Test, 10), 0);
        assert_eq!(schedule.capacity_for(Phase::Test, 11), 1);
        assert_eq!(schedule.capacity_for(Phase::Rollout, 20), 1);
        assert_eq!(schedule.capacity_for(Phase::Rollout, 21), 9);
        assert_eq!(schedule.plans()[0].start_day, 1);
    }

    #[test]
    fn test_gap_uses_default() {
        let schedule =
            ResourcePlanSchedule::new(vec![plan(1, 3, (0, 0, 0, 0)), plan(7, 9, (0, 0, 0, 0))], Capacities::default())
                .unwrap();
        assert_eq!(schedule.capacities_for(5), Capacities::default());
        assert_eq!(schedule.capacity_for(Phase::Spec, 8), 0);
    }

    #[test]
    fn test_overlap_rejected() {
        let err = ResourcePlanSchedule::new(
            vec![plan(1, 10, (1, 1, 1, 1)), plan(10, 12, (1, 1, 1, 1))],
            Capacities::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::OverlappingPlans {
                first_start: 1,
                first_end: 10,
                second_start: 10,
                second_end: 12,
            }
        );
    }

    #[test]
    fn test_contained_plan_rejected() {
        let result = ResourcePlanSchedule::new(
            vec![plan(1, 30, (1, 1, 1, 1)), plan(5, 6, (1, 1, 1, 1))],
            Capacities::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(plan(1, 24, (2, 3, 0, 0)).to_string(), "1-24:2,3,0,0");
    }
}
