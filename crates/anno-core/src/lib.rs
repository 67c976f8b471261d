//! Annotation task orchestrator
//!
//! Sequences the annotation tasks of a corpus unit:
//! - derives each task's editable state from the cached unit row
//! - validates and serializes it into the form the server expects
//! - posts it once and advances to the task the server names
//! - wraps around to the next unit after the last task
//!
//! The server, the corpus grid and client-side persistence are ports
//! ([`AnnotationApi`], [`CorpusGrid`], [`anno_store::StateStore`]) injected at
//! construction.
//!
//! # Example
//!
//! ```rust,ignore
//! use anno_core::{EngineConfig, PageCache, TaskOrchestrator};
//! use anno_model::TaskCategory;
//!
//! # async fn example(api: std::sync::Arc<dyn anno_core::AnnotationApi>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::from_file("annotation.toml")?;
//! let grid = std::sync::Arc::new(PageCache::new(page));
//! let store = std::sync::Arc::new(anno_store::MemoryStore::new());
//! let orchestrator = TaskOrchestrator::new(config, api, grid, store);
//!
//! orchestrator.open_unit(0)?;
//! orchestrator.start_task(TaskCategory::WordOrder)?;
//! let outcome = orchestrator.submit_task(TaskCategory::WordOrder).await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod api;
pub mod config;
pub mod error;
pub mod grid;
pub mod inflight;
pub mod orchestrator;
pub mod session;
pub mod tasks;
pub mod telemetry;

pub use api::{AnnotationApi, ApiError};
pub use config::{ConfigError, EngineConfig, TaskBinding, UNIT_ID_PLACEHOLDER};
pub use error::TaskError;
pub use grid::{CorpusGrid, PageCache};
pub use inflight::{InFlightGuard, InFlightRegistry};
pub use orchestrator::{SubmitOutcome, TaskOrchestrator};
pub use session::{can_transition, validate_transition, SessionPhase};
pub use tasks::{AnnotationTask, SetupContext, TaskState, TaskVariant};
pub use telemetry::{init_json_tracing, init_tracing};

/// Common imports for driving the orchestrator
pub mod prelude {
    //! Common imports for working with the orchestrator
    pub use crate::tasks::*;
    pub use crate::{
        AnnotationApi, CorpusGrid, EngineConfig, PageCache, SessionPhase, SubmitOutcome,
        TaskError, TaskOrchestrator,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
