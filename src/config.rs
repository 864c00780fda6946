//! Configuration management for devcyclesim.
//!
//! Supports layered configuration: defaults → project → user → env

use crate::domain::{Capacities, Phase};
use crate::engine::{ReworkModel, ReworkRule};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up in the project directory
pub const PROJECT_CONFIG_FILE: &str = ".devcyclesim.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub capacity: Capacities,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub rework: ReworkConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl SimulatorConfig {
    /// Load configuration with hierarchy: defaults → project → user → env
    pub fn load(project_root: Option<&Path>) -> Result<Self, ConfigError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder();

        // 1. Start with defaults
        builder = builder.add_source(config::File::from_str(
            include_str!("../default_config.toml"),
            config::FileFormat::Toml,
        ));

        // 2. Project-specific config (.devcyclesim.toml in project root)
        if let Some(root) = project_root {
            let project_config = root.join(PROJECT_CONFIG_FILE);
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }
        }

        // 3. User config (~/.config/devcyclesim/config.toml)
        if let Some(user_config) = user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        // 4. Environment variables (DEVCYCLESIM__SECTION__KEY)
        builder = builder.add_source(
            Environment::with_prefix("DEVCYCLESIM")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        let settings: Self = config
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load a single TOML file on top of the built-in defaults
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let settings: Self = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../default_config.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::from(path))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the simulator cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.duration_days == 0 {
            return Err(ConfigError::Invalid(
                "simulation.duration_days must be at least 1".to_string(),
            ));
        }
        self.generator.validate()?;
        self.rework
            .build_model(0)
            .map(|_| ())
            .map_err(|e| ConfigError::Invalid(format!("rework: {}", e)))
    }

    /// Render as TOML-like `key = value` lines
    pub fn describe(&self) -> String {
        let mut lines = vec![
            "[simulation]".to_string(),
            format!("duration_days = {}", self.simulation.duration_days),
        ];
        if let Some(seed) = self.simulation.seed {
            lines.push(format!("seed = {}", seed));
        }

        lines.push(String::new());
        lines.push("[capacity]".to_string());
        for phase in Phase::ALL {
            lines.push(format!("{} = {}", phase.as_str(), self.capacity.get(phase)));
        }

        lines.push(String::new());
        lines.push("[generator]".to_string());
        lines.push(format!("arrival_spread = {}", self.generator.arrival_spread));
        for phase in Phase::ALL {
            let range = self.generator.range(phase);
            lines.push(format!(
                "{} = {{ min = {}, max = {} }}",
                phase.as_str(),
                range.min,
                range.max
            ));
        }

        lines.push(String::new());
        lines.push("[rework]".to_string());
        lines.push(format!(
            "max_rework_per_story = {}",
            self.rework.max_rework_per_story
        ));
        for rule in &self.rework.rules {
            let tasks: Vec<String> = rule
                .tasks
                .iter()
                .map(|b| format!("{}x{}", b.phase.as_str(), b.count))
                .collect();
            lines.push(format!(
                "rule = after {} p={} tasks [{}]",
                rule.after.as_str(),
                rule.probability,
                tasks.join(", ")
            ));
        }

        lines.push(String::new());
        lines.push("[ui]".to_string());
        lines.push(format!("refresh_rate_ms = {}", self.ui.refresh_rate_ms));
        lines.push(format!("vim_navigation = {}", self.ui.vim_navigation));
        lines.join("\n")
    }
}

/// Location of the per-user config file, if the platform has one
pub fn user_config_path() -> Option<std::path::PathBuf> {
    directories::ProjectDirs::from("com", "devcyclesim", "devcyclesim")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Run length and randomness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of days to simulate
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,
    /// Seed for story generation and rework draws
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_days: default_duration_days(),
            seed: None,
        }
    }
}

fn default_duration_days() -> u32 {
    14
}

/// Inclusive range of task counts for one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min: u32,
    pub max: u32,
}

impl DurationRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Random story generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_spec_range")]
    pub spec: DurationRange,
    #[serde(default = "default_dev_range")]
    pub dev: DurationRange,
    #[serde(default = "default_test_range")]
    pub test: DurationRange,
    #[serde(default = "default_rollout_range")]
    pub rollout: DurationRange,
    /// Generated stories arrive on a day in `1..=arrival_spread`
    #[serde(default = "default_arrival_spread")]
    pub arrival_spread: u32,
}

impl GeneratorConfig {
    pub fn range(&self, phase: Phase) -> DurationRange {
        match phase {
            Phase::Spec => self.spec,
            Phase::Dev => self.dev,
            Phase::Test => self.test,
            Phase::Rollout => self.rollout,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for phase in Phase::ALL {
            let range = self.range(phase);
            if range.min == 0 || range.min > range.max {
                return Err(ConfigError::Invalid(format!(
                    "generator.{}: range {}..={} must be non-empty and start at 1 or later",
                    phase.as_str(),
                    range.min,
                    range.max
                )));
            }
        }
        if self.arrival_spread == 0 {
            return Err(ConfigError::Invalid(
                "generator.arrival_spread must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            spec: default_spec_range(),
            dev: default_dev_range(),
            test: default_test_range(),
            rollout: default_rollout_range(),
            arrival_spread: default_arrival_spread(),
        }
    }
}

fn default_spec_range() -> DurationRange {
    DurationRange::new(1, 3)
}

fn default_dev_range() -> DurationRange {
    DurationRange::new(2, 4)
}

fn default_test_range() -> DurationRange {
    DurationRange::new(1, 3)
}

fn default_rollout_range() -> DurationRange {
    DurationRange::new(1, 1)
}

fn default_arrival_spread() -> u32 {
    1
}

/// Error-rate driven rework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReworkConfig {
    #[serde(default)]
    pub rules: Vec<ReworkRule>,
    #[serde(default = "default_max_rework_per_story")]
    pub max_rework_per_story: u32,
}

impl ReworkConfig {
    /// Build the engine model with the run's seed
    pub fn build_model(
        &self,
        seed: u64,
    ) -> Result<ReworkModel, crate::error::ConfigurationError> {
        ReworkModel::new(self.rules.clone(), self.max_rework_per_story, seed)
    }
}

impl Default for ReworkConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            max_rework_per_story: default_max_rework_per_story(),
        }
    }
}

fn default_max_rework_per_story() -> u32 {
    1
}

/// UI-related configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Refresh rate in milliseconds
    #[serde(default = "default_refresh_rate_ms")]
    pub refresh_rate_ms: u64,
    /// Enable vim-style navigation
    #[serde(default = "default_vim_navigation")]
    pub vim_navigation: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: default_refresh_rate_ms(),
            vim_navigation: default_vim_navigation(),
        }
    }
}

fn default_refresh_rate_ms() -> u64 {
    100
}

fn default_vim_navigation() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SimulatorConfig::default();
        assert_eq!(config.simulation.duration_days, 14);
        assert_eq!(config.simulation.seed, None);
        assert_eq!(config.capacity, Capacities::new(2, 3, 3, 1));
        assert_eq!(config.generator.dev, DurationRange::new(2, 4));
        assert_eq!(config.generator.rollout, DurationRange::new(1, 1));
        assert!(config.rework.rules.is_empty());
        assert_eq!(config.rework.max_rework_per_story, 1);
        assert_eq!(config.ui.refresh_rate_ms, 100);
        assert!(config.ui.vim_navigation);
    }

    #[test]
    fn test_builtin_file_matches_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();
        assert_eq!(
            SimulatorConfig::load_file(&path).unwrap(),
            SimulatorConfig::default()
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[simulation]
duration_days = 30
seed = 7

[capacity]
spec = 1
dev = 2
test = 2
rollout = 1

[[rework.rules]]
after = "test"
probability = 0.25
tasks = [{{ phase = "dev", count = 2 }}, {{ phase = "test" }}]
"#
        )
        .unwrap();

        let config = SimulatorConfig::load_file(&path).unwrap();
        assert_eq!(config.simulation.duration_days, 30);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.capacity, Capacities::new(1, 2, 2, 1));
        assert_eq!(config.generator, GeneratorConfig::default());

        let rule = &config.rework.rules[0];
        assert_eq!(rule.after, Phase::Test);
        assert_eq!(rule.tasks[0].count, 2);
        assert_eq!(rule.tasks[1].count, 1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[generator.dev]\nmin = 5\nmax = 2\n").unwrap();
        assert!(matches!(
            SimulatorConfig::load_file(&path),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::write(&path, "[simulation]\nduration_days = 0\n").unwrap();
        assert!(matches!(
            SimulatorConfig::load_file(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = SimulatorConfig::load_file(Path::new("/nonexistent/devcyclesim.toml"));
        assert!(matches!(err, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_describe_lists_sections() {
        let text = SimulatorConfig::default().describe();
        assert!(text.contains("[simulation]\nduration_days = 14"));
        assert!(text.contains("dev = 3"));
        assert!(text.contains("dev = { min = 2, max = 4 }"));
        assert!(text.contains("vim_navigation = true"));
    }
}
