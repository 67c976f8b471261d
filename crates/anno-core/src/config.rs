//! Engine configuration
//!
//! Loaded from TOML. Every field has a default, so a file only needs the
//! endpoints and the task bindings of the deployment.

use anno_graph::NodeIdentity;
use anno_model::{LabelCatalog, LabelId, TaskCategory, TaskId, UnitId};
use anno_store::StoreKeys;
use anno_window::WindowSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder replaced by the unit id in [`EngineConfig::unit_data_url`]
pub const UNIT_ID_PLACEHOLDER: &str = "{unit_id}";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// A field holds an unusable value
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// What is wrong
        reason: String,
    },

    /// Tracing subscriber could not be installed
    #[error("telemetry setup failed: {0}")]
    Telemetry(String),
}

/// Server task id of one task tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskBinding {
    /// Task category
    pub category: TaskCategory,
    /// Server-side task id
    pub task_id: TaskId,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Form-post endpoint
    pub api_url: String,
    /// Unit-data endpoint; `{unit_id}` is replaced by the unit id
    pub unit_data_url: String,
    /// Window of the sentence-boundary task
    pub boundary_window: WindowSpec,
    /// Window of the token-connection task
    pub connection_window: WindowSpec,
    /// Window of the sentence-graph task
    pub sentence_graph_window: WindowSpec,
    /// Graph node deduplication
    pub node_identity: NodeIdentity,
    /// Store key prefixes
    pub keys: StoreKeys,
    /// Task id of every enabled category
    pub tasks: Vec<TaskBinding>,
    /// Captions of relation labels
    pub relation_labels: LabelCatalog,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: "/api".to_string(),
            unit_data_url: format!("/corpus/unit/{UNIT_ID_PLACEHOLDER}"),
            boundary_window: WindowSpec::new(1, 1),
            connection_window: WindowSpec::new(3, 0),
            sentence_graph_window: WindowSpec::new(3, 0),
            node_identity: NodeIdentity::default(),
            keys: StoreKeys::default(),
            tasks: Vec::new(),
            relation_labels: LabelCatalog::default(),
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Fails on malformed TOML or when [`EngineConfig::validate`] fails.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// Fails when the file cannot be read or its content is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check endpoints and task bindings
    ///
    /// # Errors
    /// Rejects empty URLs, a unit URL without the `{unit_id}` placeholder and a
    /// category bound twice.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "api_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.unit_data_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "unit_data_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !self.unit_data_url.contains(UNIT_ID_PLACEHOLDER) {
            return Err(ConfigError::Invalid {
                field: "unit_data_url",
                reason: format!("must contain {UNIT_ID_PLACEHOLDER}"),
            });
        }
        for (index, binding) in self.tasks.iter().enumerate() {
            if self.tasks[..index]
                .iter()
                .any(|earlier| earlier.category == binding.category)
            {
                return Err(ConfigError::Invalid {
                    field: "tasks",
                    reason: format!("{} is bound twice", binding.category),
                });
            }
        }
        Ok(())
    }

    /// With the form-post endpoint
    #[inline]
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// With the unit-data endpoint template
    #[inline]
    #[must_use]
    pub fn with_unit_data_url(mut self, url: impl Into<String>) -> Self {
        self.unit_data_url = url.into();
        self
    }

    /// With a task binding, replacing an earlier one of the same category
    #[must_use]
    pub fn with_task(mut self, category: TaskCategory, task_id: impl Into<TaskId>) -> Self {
        let task_id = task_id.into();
        self.tasks.retain(|binding| binding.category != category);
        self.tasks.push(TaskBinding { category, task_id });
        self
    }

    /// With every category bound, task ids `1..=8` in canonical order
    #[must_use]
    pub fn with_all_tasks(self) -> Self {
        TaskCategory::ALL
            .into_iter()
            .zip(1u64..)
            .fold(self, |config, (category, id)| config.with_task(category, id))
    }

    /// With a relation label caption
    #[must_use]
    pub fn with_relation_label(mut self, id: impl Into<LabelId>, text: impl Into<String>) -> Self {
        self.relation_labels = self.relation_labels.with_label(id, text);
        self
    }

    /// With a graph node identity policy
    #[inline]
    #[must_use]
    pub fn with_node_identity(mut self, identity: NodeIdentity) -> Self {
        self.node_identity = identity;
        self
    }

    /// Task id bound to a category
    #[must_use]
    pub fn task_id(&self, category: TaskCategory) -> Option<TaskId> {
        self.tasks
            .iter()
            .find(|binding| binding.category == category)
            .map(|binding| binding.task_id)
    }

    /// Unit-data URL of a unit
    #[must_use]
    pub fn unit_url(&self, unit: UnitId) -> String {
        self.unit_data_url
            .replace(UNIT_ID_PLACEHOLDER, &unit.to_string())
    }
}
