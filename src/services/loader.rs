//! Loading stories and resource plans from files and command-line strings.

use crate::domain::{Capacities, PhaseDurations, ResourcePlan, TaskBlock, UserStory};
use crate::error::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const PLAN_PATTERN: &str =
    r"^\s*(\d+)\s*-\s*(\d+)\s*:\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*$";

/// One entry of a stories file
#[derive(Debug, Deserialize)]
struct StoryRecord {
    id: String,
    #[serde(default)]
    tasks: Option<Vec<TaskBlock>>,
    spec: Option<u32>,
    dev: Option<u32>,
    test: Option<u32>,
    rollout: Option<u32>,
    #[serde(default = "default_day")]
    arrival_day: u32,
    #[serde(default = "default_priority")]
    priority: u32,
    feature_id: Option<String>,
}

fn default_day() -> u32 {
    1
}

fn default_priority() -> u32 {
    1
}

impl StoryRecord {
    fn has_durations(&self) -> bool {
        self.spec.is_some() || self.dev.is_some() || self.test.is_some() || self.rollout.is_some()
    }

    fn into_story(self) -> Result<UserStory, ConfigError> {
        let story = match &self.tasks {
            Some(blocks) => {
                if self.has_durations() {
                    tracing::warn!(story = %self.id, "both tasks and durations given, using tasks");
                }
                UserStory::from_tasks(self.id.clone(), TaskBlock::expand(blocks))
            }
            None => {
                let defaults = PhaseDurations::default();
                let durations = PhaseDurations::new(
                    self.spec.unwrap_or(defaults.spec),
                    self.dev.unwrap_or(defaults.dev),
                    self.test.unwrap_or(defaults.test),
                    self.rollout.unwrap_or(defaults.rollout),
                );
                UserStory::from_phase_durations(self.id.clone(), durations)
            }
        }
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let mut story = story
            .with_arrival_day(self.arrival_day)
            .with_priority(self.priority);
        if let Some(feature) = self.feature_id {
            story = story.with_feature(feature);
        }
        story
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(story)
    }
}

/// One entry of a resource plans file
#[derive(Debug, Deserialize)]
struct PlanRecord {
    start: u32,
    end: u32,
    resources: Capacities,
}

/// Parse stories from JSON text.
///
/// Each entry either lists `tasks` as `{phase, count}` blocks or gives
/// per-phase durations; missing durations take the defaults.
pub fn parse_stories(json: &str) -> Result<Vec<UserStory>, ConfigError> {
    let records: Vec<StoryRecord> =
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
    if records.is_empty() {
        tracing::warn!("stories input contains no stories");
    }
    records.into_iter().map(StoryRecord::into_story).collect()
}

/// Load stories from a JSON file
pub fn load_stories(path: &Path) -> Result<Vec<UserStory>, ConfigError> {
    let content = read(path)?;
    let stories = parse_stories(&content).map_err(|e| with_path(path, e))?;
    tracing::info!(path = %path.display(), count = stories.len(), "loaded stories");
    Ok(stories)
}

/// Parse resource plans from JSON text
pub fn parse_resource_plans(json: &str) -> Result<Vec<ResourcePlan>, ConfigError> {
    let records: Vec<PlanRecord> =
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
    records
        .into_iter()
        .map(|r| {
            ResourcePlan::new(r.start, r.end, r.resources)
                .map_err(|e| ConfigError::Invalid(e.to_string()))
        })
        .collect()
}

/// Load resource plans from a JSON file
pub fn load_resource_plans(path: &Path) -> Result<Vec<ResourcePlan>, ConfigError> {
    let content = read(path)?;
    parse_resource_plans(&content).map_err(|e| with_path(path, e))
}

/// Parse a plan given as `start-end:spec,dev,test,rollout`
pub fn parse_resource_plan(input: &str) -> Result<ResourcePlan, ConfigError> {
    let pattern = Regex::new(PLAN_PATTERN).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    let invalid = || {
        ConfigError::Invalid(format!(
            "invalid resource plan '{}', expected start-end:spec,dev,test,rollout",
            input
        ))
    };

    let caps = pattern.captures(input).ok_or_else(invalid)?;
    let mut numbers = [0u32; 6];
    for (i, number) in numbers.iter_mut().enumerate() {
        *number = caps[i + 1].parse().map_err(|_| invalid())?;
    }

    let [start, end, spec, dev, test, rollout] = numbers;
    ResourcePlan::new(start, end, Capacities::new(spec, dev, test, rollout))
        .map_err(|e| ConfigError::Invalid(format!("{}: {}", input, e)))
}

fn read(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

fn with_path(path: &Path, err: ConfigError) -> ConfigError {
    match err {
        ConfigError::Parse(msg) => ConfigError::Parse(format!("{}: {}", path.display(), msg)),
        ConfigError::Invalid(msg) => ConfigError::Invalid(format!("{}: {}", path.display(), msg)),
        other => other,
    }
}
