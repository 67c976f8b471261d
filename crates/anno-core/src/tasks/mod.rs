//! Per-category task state
//!
//! Each category has one state type implementing [`AnnotationTask`]:
//! - `setup` derives the whole editable state from the unit row (and its window)
//! - `validate` checks required inputs before anything is sent
//! - `write_fields` serializes the state into the category's form fields
//!
//! [`TaskState`] holds whichever task is active and dispatches by category.

mod boundary;
mod connection;
mod sentence_class;
mod sentence_graph;
mod token_graph;
mod token_rows;
mod word_order;

pub use boundary::SentenceBoundaryTask;
pub use connection::{ConnectionPick, ConnectionRow, ContextBoundary, TokenConnectionTask};
pub use sentence_class::{SentenceClassRow, SentenceClassificationTask};
pub use sentence_graph::{SentenceEndpointChoice, SentenceGraphRow, SentenceGraphTask};
pub use token_graph::{BoundaryGraph, RelationRow, TokenGraphTask};
pub use token_rows::{
    RowValue, TokenClassificationTask, TokenLabel, TokenRow, TokenRows, TokenText,
    TokenTextAnnotationTask,
};
pub use word_order::WordOrderTask;

use crate::config::EngineConfig;
use crate::error::TaskError;
use anno_model::{
    BoundaryId, SubmitForm, TaskCategory, TaskId, Token, TokenButton, UnitId, UnitRecord,
};
use anno_pool::TokenPoolManager;
use anno_window::{ContextWindow, ContextWindowAssembler, WindowSpec};
use tracing::debug;

/// Inputs available while a task is set up
#[derive(Debug, Clone, Copy)]
pub struct SetupContext<'a> {
    /// Server task id
    pub task_id: TaskId,
    /// Focus unit
    pub unit: &'a UnitRecord,
    /// Loaded page in grid order
    pub page: &'a [UnitRecord],
    /// Engine configuration
    pub config: &'a EngineConfig,
    /// Pool manager
    pub pools: &'a TokenPoolManager,
}

impl<'a> SetupContext<'a> {
    /// Window of `spec` around the focus unit
    ///
    /// # Errors
    /// Fails when the focus unit is not on the page.
    pub fn window(&self, spec: WindowSpec) -> Result<ContextWindow<'a>, TaskError> {
        Ok(ContextWindowAssembler::new().build_window(self.page, self.unit.id(), spec)?)
    }
}

/// Behaviour shared by every task category
pub trait AnnotationTask: TaskVariant + Sized {
    /// Category served by this task
    const CATEGORY: TaskCategory;

    /// Derive the task state from stored annotation data
    ///
    /// # Errors
    /// Fails when the unit does not satisfy the task's preconditions.
    fn setup(ctx: &SetupContext<'_>) -> Result<Self, TaskError>;

    /// Server task id
    fn task_id(&self) -> TaskId;

    /// Focus unit
    fn unit_id(&self) -> UnitId;

    /// Check required inputs
    ///
    /// # Errors
    /// Returns [`TaskError::Validation`] naming the first missing input.
    fn validate(&self) -> Result<(), TaskError> {
        Ok(())
    }

    /// Append the category's fields to `form`
    ///
    /// # Errors
    /// Fails when a payload cannot be encoded.
    fn write_fields(&self, form: SubmitForm) -> Result<SubmitForm, TaskError>;

    /// Drop client state made obsolete by an accepted submission
    fn on_submitted(&self) {}

    /// Validate and serialize into a complete form
    ///
    /// # Errors
    /// Fails on validation or encoding errors; nothing is sent in that case.
    fn to_form(&self) -> Result<SubmitForm, TaskError> {
        self.validate()?;
        self.write_fields(SubmitForm::task(Self::CATEGORY, self.task_id(), self.unit_id()))
    }
}

/// Access to a task inside [`TaskState`]
pub trait TaskVariant {
    /// Borrow the task if `state` holds this category
    fn from_state(state: &TaskState) -> Option<&Self>;

    /// Mutably borrow the task if `state` holds this category
    fn from_state_mut(state: &mut TaskState) -> Option<&mut Self>;
}

macro_rules! task_states {
    ($($variant:ident => $task:ty),* $(,)?) => {
        /// The active task of a session
        #[derive(Debug)]
        pub enum TaskState {
            $(
                #[allow(missing_docs)]
                $variant($task),
            )*
        }

        impl TaskState {
            /// Set up the task of `category`
            ///
            /// # Errors
            /// Propagates the category's setup error.
            pub fn setup(category: TaskCategory, ctx: &SetupContext<'_>) -> Result<Self, TaskError> {
                match category {
                    $(TaskCategory::$variant => Ok(Self::$variant(<$task>::setup(ctx)?)),)*
                }
            }

            /// Category of the task
            #[must_use]
            pub fn category(&self) -> TaskCategory {
                match self {
                    $(Self::$variant(_) => TaskCategory::$variant,)*
                }
            }

            /// Server task id
            #[must_use]
            pub fn task_id(&self) -> TaskId {
                match self {
                    $(Self::$variant(task) => task.task_id(),)*
                }
            }

            /// Focus unit
            #[must_use]
            pub fn unit_id(&self) -> UnitId {
                match self {
                    $(Self::$variant(task) => task.unit_id(),)*
                }
            }

            /// Validate and serialize
            ///
            /// # Errors
            /// Fails on validation or encoding errors.
            pub fn to_form(&self) -> Result<SubmitForm, TaskError> {
                match self {
                    $(Self::$variant(task) => task.to_form(),)*
                }
            }

            /// Run the task's post-submission cleanup
            pub fn on_submitted(&self) {
                match self {
                    $(Self::$variant(task) => task.on_submitted(),)*
                }
            }
        }

        $(
            impl TaskVariant for $task {
                fn from_state(state: &TaskState) -> Option<&Self> {
                    match state {
                        TaskState::$variant(task) => Some(task),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                fn from_state_mut(state: &mut TaskState) -> Option<&mut Self> {
                    match state {
                        TaskState::$variant(task) => Some(task),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            }

            impl From<$task> for TaskState {
                fn from(task: $task) -> Self {
                    Self::$variant(task)
                }
            }
        )*
    };
}

task_states! {
    SentenceBoundary => SentenceBoundaryTask,
    WordOrder => WordOrderTask,
    TokenTextAnnotation => TokenTextAnnotationTask,
    TokenClassification => TokenClassificationTask,
    TokenGraph => TokenGraphTask,
    TokenConnection => TokenConnectionTask,
    SentenceClassification => SentenceClassificationTask,
    SentenceGraph => SentenceGraphTask,
}

/// One sentence of the focus unit in word order
#[derive(Debug, Clone)]
pub(crate) struct OrderedSentence<'a> {
    pub(crate) boundary_id: BoundaryId,
    pub(crate) tokens: Vec<&'a Token>,
}

/// Every live sentence of `unit` with its tokens in word order
///
/// Sentence-scoped tasks run only after the word-order task, so a sentence
/// without a word order is an error here rather than an empty row set.
pub(crate) fn ordered_sentences(unit: &UnitRecord) -> Result<Vec<OrderedSentence<'_>>, TaskError> {
    unit.sentence_ids()
        .map(|boundary_id| {
            let order = unit.require_word_order(boundary_id)?;
            let tokens = order
                .iter()
                .filter_map(|id| {
                    let token = unit.token(*id);
                    if token.is_none() {
                        debug!(unit = %unit.id(), %boundary_id, token = %id, "word order names unknown token");
                    }
                    token
                })
                .collect();
            Ok(OrderedSentence { boundary_id, tokens })
        })
        .collect()
}

/// Rendered token texts joined by a space
pub(crate) fn header_text<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> String {
    tokens
        .into_iter()
        .map(|token| TokenButton::render(token).text().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
