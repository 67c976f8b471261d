//! Context window assembler
//!
//! Slices a window of neighbouring units out of the loaded corpus page around a
//! focus unit. The window is read-only: it borrows the page and exposes
//! - the units before, at and after the focus
//! - every live boundary with its word order and local/context flag
//! - visibility checks used to hide relations that leave the window
//!
//! Windows never reach beyond the page. A focus at a page edge yields a
//! shorter window, not an error.

#![warn(unreachable_pub)]

mod assembler;
mod error;
mod window;

pub use assembler::{ContextWindowAssembler, WindowSpec};
pub use error::WindowError;
pub use window::{ContextWindow, WindowBoundary};
