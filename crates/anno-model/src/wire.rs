//! Write-side wire shapes
//!
//! Submissions are form posts with a fixed envelope (`action`, `task_id`,
//! `verse_id`) plus task-specific fields whose values are JSON-encoded.

use crate::ids::{BoundaryId, TaskId, TokenId, UnitId};
use crate::task::TaskCategory;
use crate::token::{Analysis, Misc, Token};
use serde::{Deserialize, Serialize};
use std::fmt;

const BOUNDARY_PREFIX: &str = "boundary-";
const TOKEN_PREFIX: &str = "token-button-";

/// Element id of a boundary, as used in word-order payloads and store keys
#[must_use]
pub fn boundary_element_id(id: BoundaryId) -> String {
    format!("{BOUNDARY_PREFIX}{id}")
}

/// Element id of a token button
#[must_use]
pub fn token_element_id(id: TokenId) -> String {
    format!("{TOKEN_PREFIX}{id}")
}

/// Parse a token reference written either as `token-button-<id>` or as a bare id
#[must_use]
pub fn parse_token_element_id(text: &str) -> Option<TokenId> {
    let text = text.trim();
    text.strip_prefix(TOKEN_PREFIX)
        .unwrap_or(text)
        .parse()
        .ok()
}

/// Form action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Submit a task
    Update(TaskCategory),
    /// Add a manual token (also used for merges)
    AddToken,
    /// Replace a token by several new ones
    SplitToken,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update(category) => write!(f, "update_{category}"),
            Self::AddToken => f.write_str("add_token"),
            Self::SplitToken => f.write_str("split_token"),
        }
    }
}

/// A form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitForm {
    action: Action,
    unit_id: UnitId,
    task_id: Option<TaskId>,
    fields: Vec<(String, String)>,
}

impl SubmitForm {
    /// Task submission
    #[must_use]
    pub fn task(category: TaskCategory, task_id: TaskId, unit_id: UnitId) -> Self {
        Self {
            action: Action::Update(category),
            unit_id,
            task_id: Some(task_id),
            fields: Vec::new(),
        }
    }

    /// Out-of-task action on a unit
    #[must_use]
    pub fn action(action: Action, unit_id: UnitId) -> Self {
        Self {
            action,
            unit_id,
            task_id: None,
            fields: Vec::new(),
        }
    }

    /// Add a plain field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Add a JSON-encoded field
    ///
    /// # Errors
    /// Fails when `value` cannot be serialized.
    pub fn with_json_field<T: Serialize + ?Sized>(
        self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        let encoded = serde_json::to_string(value)?;
        Ok(self.with_field(name, encoded))
    }

    /// Form action
    #[inline]
    #[must_use]
    pub fn action_kind(&self) -> Action {
        self.action
    }

    /// Target unit
    #[inline]
    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    /// Task id, for task submissions
    #[inline]
    #[must_use]
    pub fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Value of a task-specific field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Flatten into form pairs, envelope first
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        let mut pairs = vec![("action".to_string(), self.action.to_string())];
        if let Some(task_id) = self.task_id {
            pairs.push(("task_id".to_string(), task_id.to_string()));
        }
        pairs.push(("verse_id".to_string(), self.unit_id.to_string()));
        pairs.extend(self.fields);
        pairs
    }
}

/// Server reply to a form submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Whether the write was accepted
    #[serde(default)]
    pub success: bool,
    /// Message for the user
    #[serde(default)]
    pub message: String,
    /// Notification style (`success`, `warning`, `danger`, …)
    #[serde(default)]
    pub style: String,
    /// First task in the sequence, present for task submissions
    #[serde(default)]
    pub first_task: Option<TaskCategory>,
    /// Task to continue with
    #[serde(default)]
    pub next_task: Option<TaskCategory>,
    /// Action-specific data
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl SubmitResponse {
    /// Whether the server asks to wrap around to the first task
    #[must_use]
    pub fn wraps_around(&self) -> bool {
        self.next_task.is_some() && self.next_task == self.first_task
    }

    /// Id of a token created by `add_token`
    #[must_use]
    pub fn added_token_id(&self) -> Option<TokenId> {
        self.data
            .as_ref()?
            .get("id")?
            .as_u64()
            .map(TokenId)
    }

    /// Ids of tokens created by `split_token`
    #[must_use]
    pub fn split_ids(&self) -> Vec<TokenId> {
        self.data
            .as_ref()
            .and_then(|data| data.get("splits"))
            .and_then(serde_json::Value::as_array)
            .map(|ids| ids.iter().filter_map(serde_json::Value::as_u64).map(TokenId).collect())
            .unwrap_or_default()
    }
}

/// Token data for `add_token` and `split_token`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewToken {
    /// Surface text
    pub text: String,
    /// Lemma
    pub lemma: String,
    /// Inner id; merges use `group_<parts>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_id: Option<String>,
    /// Analysis
    pub analysis: Analysis,
}

impl NewToken {
    /// A plain manual token
    #[must_use]
    pub fn new(text: impl Into<String>, lemma: impl Into<String>) -> Self {
        let text = text.into();
        let lemma = lemma.into();
        Self {
            analysis: Analysis {
                form: Some(text.clone()),
                lemma: Some(lemma.clone()),
                ..Analysis::default()
            },
            text,
            lemma,
            inner_id: None,
        }
    }

    /// Set the analysis
    #[must_use]
    pub fn with_analysis(mut self, analysis: Analysis) -> Self {
        self.analysis = analysis;
        self
    }

    /// The token resulting from merging `first` with `second`
    ///
    /// Text is joined with `_`; parts accumulate the constituents of already
    /// merged tokens so repeated merges stay flat.
    #[must_use]
    pub fn merged(first: &Token, second: &Token) -> Self {
        let text = [first, second]
            .iter()
            .map(|t| t.text.as_deref().unwrap_or_default())
            .collect::<Vec<_>>()
            .join("_");
        let mut parts = first.merge_parts();
        parts.extend(second.merge_parts());
        let inner_id = format!(
            "group_{}",
            parts
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("_")
        );
        Self {
            analysis: Analysis {
                form: Some(text.clone()),
                lemma: Some("_".to_string()),
                misc: Misc {
                    parts,
                    ..Misc::default()
                },
                ..Analysis::default()
            },
            text,
            lemma: "_".to_string(),
            inner_id: Some(inner_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn form_pairs_start_with_envelope() {
        let form = SubmitForm::task(TaskCategory::TokenGraph, TaskId(5), UnitId(3))
            .with_field("token_graph_data", "[]");
        assert_eq!(
            form.into_pairs(),
            vec![
                ("action".to_string(), "update_token_graph".to_string()),
                ("task_id".to_string(), "5".to_string()),
                ("verse_id".to_string(), "3".to_string()),
                ("token_graph_data".to_string(), "[]".to_string()),
            ]
        );
    }

    #[test]
    fn out_of_task_action_has_no_task_id() {
        let pairs = SubmitForm::action(Action::AddToken, UnitId(3)).into_pairs();
        assert_eq!(pairs[0].1, "add_token");
        assert!(pairs.iter().all(|(k, _)| k != "task_id"));
    }

    #[test]
    fn token_references_accept_both_spellings() {
        assert_eq!(parse_token_element_id("token-button-12"), Some(TokenId(12)));
        assert_eq!(parse_token_element_id(" 12 "), Some(TokenId(12)));
        assert_eq!(parse_token_element_id("boundary-12"), None);
        assert_eq!(boundary_element_id(BoundaryId(4)), "boundary-4");
    }

    #[test]
    fn response_wraps_when_next_is_first() {
        let response: SubmitResponse = serde_json::from_value(json!({
            "success": true,
            "message": "Successfully updated!",
            "style": "success",
            "first_task": "sentence_boundary",
            "next_task": "sentence_boundary",
            "data": null
        }))
        .unwrap();
        assert!(response.wraps_around());

        let rejected: SubmitResponse =
            serde_json::from_value(json!({"success": false, "message": "Invalid action."}))
                .unwrap();
        assert!(!rejected.wraps_around());
    }

    #[test]
    fn response_data_accessors() {
        let added = SubmitResponse {
            data: Some(json!({"id": 77})),
            ..SubmitResponse::default()
        };
        assert_eq!(added.added_token_id(), Some(TokenId(77)));

        let split = SubmitResponse {
            data: Some(json!({"splits": [80, 81]})),
            ..SubmitResponse::default()
        };
        assert_eq!(split.split_ids(), vec![TokenId(80), TokenId(81)]);
    }

    #[test]
    fn merged_token_accumulates_parts() {
        let first = Token::new(10, "rāmaḥ");
        let mut second = Token::new(20, "a_b");
        second.analysis.misc.parts = vec![TokenId(11), TokenId(12)];

        let merged = NewToken::merged(&first, &second);
        assert_eq!(merged.text, "rāmaḥ_a_b");
        assert_eq!(merged.inner_id.as_deref(), Some("group_10_11_12"));
        assert_eq!(
            merged.analysis.misc.parts,
            vec![TokenId(10), TokenId(11), TokenId(12)]
        );
    }
}
