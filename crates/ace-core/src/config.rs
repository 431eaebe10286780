//! Pipeline configuration.

use crate::pipeline::fanout::FanOutConfig;

/// Default team name for [`TeamManager::standard`](crate::TeamManager::standard).
pub const DEFAULT_TEAM_NAME: &str = "ImprovementTeam";

/// Environment variable overriding [`DEFAULT_TEAM_NAME`].
pub const TEAM_NAME_ENV: &str = "ACE_TEAM_NAME";

/// Settings for a standard Generator/Reflector/Curator team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub team_name: String,
    /// Applied to both the Reflector and the Curator.
    pub fan_out: FanOutConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            team_name: DEFAULT_TEAM_NAME.to_string(),
            fan_out: FanOutConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read `ACE_TEAM_NAME` and `ACE_MAX_CONCURRENT_CALLS`, defaulting the rest.
    pub fn from_env() -> Self {
        Self {
            team_name: std::env::var(TEAM_NAME_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TEAM_NAME.to_string()),
            fan_out: FanOutConfig::from_env(),
        }
    }

    pub fn with_team_name(mut self, name: impl Into<String>) -> Self {
        self.team_name = name.into();
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.fan_out = FanOutConfig::new(max_concurrent);
        self
    }
}
