//! Random story generation.

use crate::config::GeneratorConfig;
use crate::domain::{Phase, PhaseDurations, UserStory};
use crate::error::ConfigurationError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces `STORY-{n}` stories with durations drawn from configured ranges
#[derive(Debug, Clone)]
pub struct StoryGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl StoryGenerator {
    /// Seeded generators are reproducible; without a seed the OS provides entropy
    pub fn new(config: GeneratorConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    /// Generate `count` stories numbered from 1
    pub fn generate(&mut self, count: usize) -> Result<Vec<UserStory>, ConfigurationError> {
        (1..=count).map(|n| self.story(n)).collect()
    }

    fn story(&mut self, n: usize) -> Result<UserStory, ConfigurationError> {
        let mut draw = |phase: Phase| {
            let range = self.config.range(phase);
            self.rng.gen_range(range.min..=range.max.max(range.min))
        };
        let durations = PhaseDurations::new(
            draw(Phase::Spec),
            draw(Phase::Dev),
            draw(Phase::Test),
            draw(Phase::Rollout),
        );

        let spread = self.config.arrival_spread.max(1);
        let arrival_day = self.rng.gen_range(1..=spread);
        Ok(UserStory::from_phase_durations(format!("STORY-{}", n), durations)?
            .with_arrival_day(arrival_day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DurationRange;

    #[test]
    fn test_ids_and_ranges() {
        let mut generator = StoryGenerator::new(GeneratorConfig::default(), Some(3));
        let stories = generator.generate(50).unwrap();
        assert_eq!(stories.len(), 50);
        assert_eq!(stories[0].id, "STORY-1");
        assert_eq!(stories[49].id, "STORY-50");

        for story in &stories {
            let work = story.completed_work();
            assert_eq!(work.values().sum::<usize>(), 0);
            let count = |phase: Phase| story.tasks.iter().filter(|t| t.phase == phase).count();
            assert!((1..=3).contains(&count(Phase::Spec)));
            assert!((2..=4).contains(&count(Phase::Dev)));
            assert!((1..=3).contains(&count(Phase::Test)));
            assert_eq!(count(Phase::Rollout), 1);
            assert_eq!(story.arrival_day, 1);
        }
    }

    #[test]
    fn test_same_seed_same_stories() {
        let config = GeneratorConfig {
            arrival_spread: 10,
            ..GeneratorConfig::default()
        };
        let a = StoryGenerator::new(config.clone(), Some(42)).generate(20).unwrap();
        let b = StoryGenerator::new(config, Some(42)).generate(20).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|s| (1..=10).contains(&s.arrival_day)));
    }

    #[test]
    fn test_fixed_ranges() {
        let config = GeneratorConfig {
            spec: DurationRange::new(2, 2),
            dev: DurationRange::new(3, 3),
            test: DurationRange::new(3, 3),
            rollout: DurationRange::new(1, 1),
            arrival_spread: 1,
        };
        let stories = StoryGenerator::new(config, None).generate(5).unwrap();
        assert!(stories.iter().all(|s| s.total_tasks() == 9));
    }
}
