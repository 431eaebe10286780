//! Caller-supplied input for one pipeline run.

use serde::{Deserialize, Serialize};

/// Rendered in place of a prompt field the pipeline has no value for.
pub const EMPTY_PLACEHOLDER: &str = "empty";

/// One playbook bullet. Identifiers are assigned externally and never minted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookEntry {
    /// Numerically prefixed identifier, e.g. `"003 formulas_and_calculations"`.
    pub id: String,
    pub content: String,
}

impl PlaybookEntry {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Ordered snapshot of playbook bullets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Playbook(Vec<PlaybookEntry>);

impl Playbook {
    pub fn new(entries: Vec<PlaybookEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[PlaybookEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a bullet by its identifier.
    pub fn get(&self, id: &str) -> Option<&PlaybookEntry> {
        self.0.iter().find(|entry| entry.id == id)
    }

    /// Serialize as a JSON array of `{id, content}` records for embedding in prompts.
    pub fn to_prompt_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }
}

impl FromIterator<PlaybookEntry> for Playbook {
    fn from_iter<I: IntoIterator<Item = PlaybookEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Input for one pipeline run. Immutable for the duration of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub query: String,
    #[serde(default)]
    pub playbook: Playbook,
    /// Reference answer shown to the Reflector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<String>,
    /// Execution feedback shown to the Reflector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_feedback: Option<String>,
}

impl Task {
    pub fn new(query: impl Into<String>, playbook: Playbook) -> Self {
        Self {
            query: query.into(),
            playbook,
            ground_truth: None,
            environment_feedback: None,
        }
    }

    pub fn with_ground_truth(mut self, ground_truth: impl Into<String>) -> Self {
        self.ground_truth = Some(ground_truth.into());
        self
    }

    pub fn with_environment_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.environment_feedback = Some(feedback.into());
        self
    }

    pub fn ground_truth_or_placeholder(&self) -> &str {
        self.ground_truth.as_deref().unwrap_or(EMPTY_PLACEHOLDER)
    }

    pub fn environment_feedback_or_placeholder(&self) -> &str {
        self.environment_feedback
            .as_deref()
            .unwrap_or(EMPTY_PLACEHOLDER)
    }

    /// SHA-256 hex digest of `serde_json::to_vec(self)`. Used to tag log lines.
    pub fn digest(&self) -> serde_json::Result<String> {
        use sha2::Digest as _;
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(sha2::Sha256::digest(&bytes)))
    }
}
