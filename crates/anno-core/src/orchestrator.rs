//! Task orchestrator
//!
//! Owns the open unit and its active task:
//! - opening a unit selects its grid row and stores the navigation cursor
//! - setting up a task derives its whole state from the cached unit row
//! - submitting serializes under the session lock, posts once and advances to
//!   the task the server names, wrapping to the next unit after the last one
//! - out-of-task token actions refresh the unit and patch an open word-order
//!   layout in place
//!
//! The session lock is never held across an await. Each (unit, action) pair
//! has at most one request outstanding.

use crate::api::AnnotationApi;
use crate::config::EngineConfig;
use crate::error::TaskError;
use crate::grid::CorpusGrid;
use crate::inflight::InFlightRegistry;
use crate::session::{validate_transition, SessionPhase};
use crate::tasks::{AnnotationTask, SetupContext, TaskState};
use anno_model::{
    Action, BoundaryId, NewToken, SubmitForm, SubmitResponse, TaskCategory, TaskId, TokenId,
    UnitId, UnitRecord,
};
use anno_pool::TokenPoolManager;
use anno_store::{NavigationCursor, StateStore};
use anno_window::WindowError;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a task submission that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted; the session moved on
    Advanced {
        /// Unit now open
        unit: UnitId,
        /// Task now active, if the server named one that could be set up
        next_task: Option<TaskCategory>,
        /// Whether the sequence wrapped to the next unit
        wrapped: bool,
        /// Server message
        message: String,
    },
    /// Refused by the server; the task stays editable
    Rejected {
        /// Server message
        message: String,
        /// Notification style
        style: String,
    },
}

impl SubmitOutcome {
    /// Whether the server accepted the submission
    #[inline]
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

#[derive(Debug, Default)]
struct Session {
    phase: SessionPhase,
    unit: Option<UnitId>,
    task: Option<TaskState>,
}

/// Sequences annotation tasks over the units of a corpus page
pub struct TaskOrchestrator {
    config: EngineConfig,
    api: Arc<dyn AnnotationApi>,
    grid: Arc<dyn CorpusGrid>,
    store: Arc<dyn StateStore>,
    pools: TokenPoolManager,
    inflight: InFlightRegistry,
    session: Mutex<Session>,
}

impl fmt::Debug for TaskOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskOrchestrator")
            .field("grid", &self.grid)
            .field("store", &self.store)
            .field("inflight", &self.inflight.len())
            .field("session", &*self.session.lock())
            .finish_non_exhaustive()
    }
}

impl TaskOrchestrator {
    /// Create an orchestrator with nothing open
    #[must_use]
    pub fn new(
        config: EngineConfig,
        api: Arc<dyn AnnotationApi>,
        grid: Arc<dyn CorpusGrid>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        let pools = TokenPoolManager::new(Arc::clone(&store), config.keys.clone());
        Self {
            config,
            api,
            grid,
            store,
            pools,
            inflight: InFlightRegistry::new(),
            session: Mutex::new(Session::default()),
        }
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pool manager shared by word-order tasks
    #[inline]
    #[must_use]
    pub fn pools(&self) -> &TokenPoolManager {
        &self.pools
    }

    /// Current session phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session.lock().phase
    }

    /// Open unit
    #[must_use]
    pub fn open_unit_id(&self) -> Option<UnitId> {
        self.session.lock().unit
    }

    /// Whether an action on a unit awaits its response
    #[must_use]
    pub fn is_in_flight(&self, unit: UnitId, action: Action) -> bool {
        self.inflight.is_in_flight(unit, action)
    }

    /// Open the unit at a grid index
    ///
    /// Drops the active task and stores the navigation cursor.
    ///
    /// # Errors
    /// Fails while a submission is outstanding and for indexes past the page.
    pub fn open_unit(&self, index: usize) -> Result<UnitId, TaskError> {
        let mut session = self.session.lock();
        if session.phase.is_submitting() {
            return Err(TaskError::InvalidPhase {
                from: session.phase,
                to: SessionPhase::Idle,
            });
        }
        self.open_locked(&mut session, index)
    }

    /// Set up a task for a unit
    ///
    /// # Errors
    /// Fails while a submission is outstanding, for units not on the page and
    /// when the unit does not satisfy the task's preconditions. The previous
    /// task stays active on failure.
    pub fn setup_task(
        &self,
        category: TaskCategory,
        task_id: TaskId,
        unit: UnitId,
    ) -> Result<(), TaskError> {
        let mut session = self.session.lock();
        if session.phase.is_submitting() {
            return Err(TaskError::InvalidPhase {
                from: session.phase,
                to: SessionPhase::TaskActive(category),
            });
        }
        self.setup_locked(&mut session, category, task_id, unit)
    }

    /// Set up the configured task of a category for the open unit
    ///
    /// # Errors
    /// Fails without an open unit or a configured task id, and as
    /// [`TaskOrchestrator::setup_task`].
    pub fn start_task(&self, category: TaskCategory) -> Result<(), TaskError> {
        let task_id = self
            .config
            .task_id(category)
            .ok_or(TaskError::UnboundCategory(category))?;
        let unit = self.open_unit_id().ok_or(TaskError::NoOpenUnit)?;
        self.setup_task(category, task_id, unit)
    }

    /// Read the active task
    ///
    /// # Errors
    /// Fails without an active task or when it is of another category.
    pub fn with_task<T: AnnotationTask, R>(&self, read: impl FnOnce(&T) -> R) -> Result<R, TaskError> {
        let session = self.session.lock();
        let state = session.task.as_ref().ok_or(TaskError::NoActiveTask)?;
        let task = T::from_state(state).ok_or(TaskError::WrongCategory {
            expected: T::CATEGORY,
            actual: state.category(),
        })?;
        Ok(read(task))
    }

    /// Edit the active task
    ///
    /// # Errors
    /// Fails without an active task, when it is of another category, while
    /// its submission is outstanding, and with the editor's own error.
    pub fn edit<T: AnnotationTask, R>(
        &self,
        apply: impl FnOnce(&mut T) -> Result<R, TaskError>,
    ) -> Result<R, TaskError> {
        let mut session = self.session.lock();
        if session.phase.is_submitting() {
            let unit = session.unit.ok_or(TaskError::NoOpenUnit)?;
            return Err(TaskError::SubmissionInFlight {
                unit,
                action: Action::Update(T::CATEGORY),
            });
        }
        let state = session.task.as_mut().ok_or(TaskError::NoActiveTask)?;
        let actual = state.category();
        let task = T::from_state_mut(state).ok_or(TaskError::WrongCategory {
            expected: T::CATEGORY,
            actual,
        })?;
        apply(task)
    }

    /// Validate, post and advance the active task
    ///
    /// The payload is built before the request is issued. On success the
    /// unit row is refreshed, the task's client state is cleared and the task
    /// named by the server is set up; when the server wraps around to the
    /// first task the unit stored as "next" is opened first.
    ///
    /// # Errors
    /// Fails without an active task of `category`, on validation errors (no
    /// request is made), while the same submission is outstanding, and on
    /// transport errors (the task becomes [`SessionPhase::TaskFailed`]).
    pub async fn submit_task(&self, category: TaskCategory) -> Result<SubmitOutcome, TaskError> {
        let (form, unit, _guard) = {
            let mut session = self.session.lock();
            let state = session.task.as_ref().ok_or(TaskError::NoActiveTask)?;
            if state.category() != category {
                return Err(TaskError::WrongCategory {
                    expected: category,
                    actual: state.category(),
                });
            }
            let unit = state.unit_id();
            let action = Action::Update(category);
            let guard = self
                .inflight
                .try_acquire(unit, action)
                .ok_or(TaskError::SubmissionInFlight { unit, action })?;
            let form = state.to_form()?;
            validate_transition(session.phase, SessionPhase::Submitting(category))?;
            session.phase = SessionPhase::Submitting(category);
            (form, unit, guard)
        };

        info!(%unit, %category, "submitting task");
        match self.api.submit(form).await {
            Err(error) => {
                warn!(%unit, %category, %error, "task submission failed");
                self.mark_failed(category);
                Err(error.into())
            }
            Ok(response) if !response.success => {
                info!(%unit, %category, message = %response.message, "task submission rejected");
                self.mark_failed(category);
                Ok(SubmitOutcome::Rejected {
                    message: response.message,
                    style: response.style,
                })
            }
            Ok(response) => Ok(self.advance(unit, category, response).await),
        }
    }

    /// Fetch a unit row, replace it in the grid and rebuild an open word-order layout
    ///
    /// # Errors
    /// Fails when the row cannot be fetched.
    pub async fn refresh_unit(&self, unit: UnitId) -> Result<UnitRecord, TaskError> {
        let record = self.api.fetch_unit(unit).await?;
        if !self.grid.replace_unit(record.clone()) {
            debug!(%unit, "refreshed unit is not on the page");
        }
        let mut session = self.session.lock();
        if let Some(TaskState::WordOrder(task)) = session.task.as_mut() {
            if task.unit_id() == unit {
                task.rebuild(record.clone());
                debug!(%unit, "word order layout rebuilt");
            }
        }
        Ok(record)
    }

    /// Add a manual token to a unit
    ///
    /// # Errors
    /// Fails when the server refuses, when the response lacks the new id, and
    /// when the unit cannot be refreshed.
    pub async fn add_token(&self, unit: UnitId, token: &NewToken) -> Result<TokenId, TaskError> {
        let form = SubmitForm::action(Action::AddToken, unit).with_json_field("token_data", token)?;
        let response = self.post_action(form).await?;
        let id = response
            .added_token_id()
            .ok_or(TaskError::MissingResponseData("data.id"))?;
        self.refresh_unit(unit).await?;
        info!(%unit, token = %id, "token added");
        Ok(id)
    }

    /// Merge two tokens into a new manual token that takes their place
    ///
    /// # Errors
    /// Fails for tokens the cached unit does not hold, and as
    /// [`TaskOrchestrator::add_token`].
    pub async fn merge_tokens(
        &self,
        unit: UnitId,
        first: TokenId,
        second: TokenId,
    ) -> Result<TokenId, TaskError> {
        let merged = {
            let page = self.grid.page();
            let record = cached_unit(&page, unit)?;
            let a = record.token(first).ok_or(TaskError::UnknownToken(first))?;
            let b = record.token(second).ok_or(TaskError::UnknownToken(second))?;
            NewToken::merged(a, b)
        };
        let id = self.add_token(unit, &merged).await?;
        self.substitute(unit, &[first, second], &[id])?;
        Ok(id)
    }

    /// Replace a token by new tokens that take its place
    ///
    /// # Errors
    /// Fails when the server refuses, when the response lacks the new ids, and
    /// when the unit cannot be refreshed.
    pub async fn split_token(
        &self,
        unit: UnitId,
        token: TokenId,
        parts: &[NewToken],
    ) -> Result<Vec<TokenId>, TaskError> {
        let form = SubmitForm::action(Action::SplitToken, unit)
            .with_field("token_id", token.to_string())
            .with_json_field("token_split_data", parts)?;
        let response = self.post_action(form).await?;
        let ids = response.split_ids();
        if ids.is_empty() {
            return Err(TaskError::MissingResponseData("data.splits"));
        }
        self.refresh_unit(unit).await?;
        self.substitute(unit, &[token], &ids)?;
        info!(%unit, %token, splits = ?ids, "token split");
        Ok(ids)
    }

    fn open_locked(&self, session: &mut Session, index: usize) -> Result<UnitId, TaskError> {
        let unit = self
            .grid
            .page()
            .get(index)
            .map(UnitRecord::id)
            .ok_or(TaskError::IndexOutOfRange(index))?;
        self.grid.select(index);
        NavigationCursor::at(index, unit).save(self.store.as_ref());
        session.phase = SessionPhase::Idle;
        session.unit = Some(unit);
        session.task = None;
        info!(%unit, index, "unit opened");
        Ok(unit)
    }

    fn setup_locked(
        &self,
        session: &mut Session,
        category: TaskCategory,
        task_id: TaskId,
        unit: UnitId,
    ) -> Result<(), TaskError> {
        let page = self.grid.page();
        let record = cached_unit(&page, unit)?;
        let task = TaskState::setup(
            category,
            &SetupContext {
                task_id,
                unit: record,
                page: &page,
                config: &self.config,
                pools: &self.pools,
            },
        )?;
        let to = SessionPhase::TaskActive(category);
        validate_transition(session.phase, to)?;
        session.phase = to;
        session.unit = Some(unit);
        session.task = Some(task);
        info!(%unit, %category, %task_id, "task set up");
        Ok(())
    }

    fn mark_failed(&self, category: TaskCategory) {
        let mut session = self.session.lock();
        if session.phase == SessionPhase::Submitting(category) {
            session.phase = SessionPhase::TaskFailed(category);
        }
    }

    async fn advance(
        &self,
        unit: UnitId,
        category: TaskCategory,
        response: SubmitResponse,
    ) -> SubmitOutcome {
        if let Err(error) = self.refresh_unit(unit).await {
            warn!(%unit, %error, "row refresh after submission failed");
        }
        {
            let session = self.session.lock();
            if let Some(task) = session
                .task
                .as_ref()
                .filter(|task| task.category() == category && task.unit_id() == unit)
            {
                task.on_submitted();
            }
        }

        let wrapped = response.wraps_around();
        let mut session = self.session.lock();
        let mut open = unit;
        if wrapped {
            match NavigationCursor::stored_next_index(self.store.as_ref()) {
                Some(index) => match self.open_locked(&mut session, index) {
                    Ok(next) => open = next,
                    Err(error) => warn!(index, %error, "next unit could not be opened"),
                },
                None => warn!("no next unit stored"),
            }
        }

        let mut active = None;
        if let Some(next) = response.next_task {
            match self.config.task_id(next) {
                Some(task_id) => match self.setup_locked(&mut session, next, task_id, open) {
                    Ok(()) => active = Some(next),
                    Err(error) => warn!(unit = %open, category = %next, %error, "next task setup failed"),
                },
                None => warn!(category = %next, "next task has no configured id"),
            }
        }
        if active.is_none() {
            session.phase = SessionPhase::Idle;
            session.unit = Some(open);
            session.task = None;
        }
        info!(%unit, %category, next = ?active, wrapped, "task accepted");

        SubmitOutcome::Advanced {
            unit: open,
            next_task: active,
            wrapped,
            message: response.message,
        }
    }

    async fn post_action(&self, form: SubmitForm) -> Result<SubmitResponse, TaskError> {
        let unit = form.unit_id();
        let action = form.action_kind();
        let _guard = self
            .inflight
            .try_acquire(unit, action)
            .ok_or(TaskError::SubmissionInFlight { unit, action })?;
        info!(%unit, %action, "posting action");
        let response = self.api.submit(form).await?;
        if !response.success {
            return Err(TaskError::Rejected {
                message: response.message,
                style: response.style,
            });
        }
        Ok(response)
    }

    fn substitute(
        &self,
        unit: UnitId,
        originals: &[TokenId],
        replacements: &[TokenId],
    ) -> Result<Option<BoundaryId>, TaskError> {
        let mut session = self.session.lock();
        match session.task.as_mut() {
            Some(TaskState::WordOrder(task)) if task.unit_id() == unit => {
                task.substitute(originals, replacements).map(Some)
            }
            _ => {
                debug!(%unit, "no word order layout to patch");
                Ok(None)
            }
        }
    }
}

fn cached_unit(page: &[UnitRecord], unit: UnitId) -> Result<&UnitRecord, TaskError> {
    page.iter()
        .find(|record| record.id() == unit)
        .ok_or(TaskError::Window(WindowError::FocusNotLoaded(unit)))
}
