//! Error-rate driven rework injection.

use crate::domain::{Phase, TaskBlock, UserStory};
use crate::error::ConfigurationError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Inserts `tasks` into a story that just left the `after` step,
/// with the given probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReworkRule {
    pub after: Phase,
    pub probability: f64,
    pub tasks: Vec<TaskBlock>,
}

impl ReworkRule {
    pub fn new(after: Phase, probability: f64, tasks: Vec<TaskBlock>) -> Self {
        Self {
            after,
            probability,
            tasks,
        }
    }

    /// A failed test sends the story back for one more development and test day
    pub fn failed_test(probability: f64) -> Self {
        Self::new(
            Phase::Test,
            probability,
            vec![TaskBlock::new(Phase::Dev, 1), TaskBlock::new(Phase::Test, 1)],
        )
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(ConfigurationError::InvalidReworkProbability(self.probability));
        }
        if self.tasks.iter().all(|b| b.count == 0) {
            return Err(ConfigurationError::EmptyReworkRule(self.after));
        }
        Ok(())
    }
}

/// Applies rework rules with a seeded random source.
///
/// Probabilities of exactly 0 or 1 never consume random numbers, so a run
/// without uncertain rules is identical for every seed.
#[derive(Debug, Clone)]
pub struct ReworkModel {
    rules: Vec<ReworkRule>,
    max_per_story: u32,
    rng: StdRng,
}

impl ReworkModel {
    /// Create a model; rules are evaluated in the given order
    pub fn new(
        rules: Vec<ReworkRule>,
        max_per_story: u32,
        seed: u64,
    ) -> Result<Self, ConfigurationError> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self {
            rules,
            max_per_story,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// A model that never injects rework
    pub fn none() -> Self {
        Self {
            rules: Vec::new(),
            max_per_story: 0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Whether the model can never insert tasks
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() || self.max_per_story == 0
    }

    /// Possibly insert rework tasks into a story drained from the `completed`
    /// step. At most one rule fires per call. Returns whether tasks were added.
    pub fn apply(&mut self, story: &mut UserStory, completed: Phase) -> bool {
        if story.rework_count >= self.max_per_story {
            return false;
        }

        for rule in self.rules.iter().filter(|r| r.after == completed) {
            let fires = if rule.probability <= 0.0 {
                false
            } else if rule.probability >= 1.0 {
                true
            } else {
                self.rng.gen_bool(rule.probability)
            };

            if fires {
                story.insert_tasks(TaskBlock::expand(&rule.tasks));
                story.rework_count += 1;
                return true;
            }
        }
        false
    }
}

impl Default for ReworkModel {
    fn default() -> Self {
        Self::none()
    }
}
