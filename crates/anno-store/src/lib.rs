//! Annotation state store
//!
//! A string key-value port that keeps per-boundary pool state and navigation
//! cursors alive across page reloads.
//!
//! - [`StateStore`]: get/set/remove over string keys
//! - [`MemoryStore`]: concurrent in-memory implementation
//! - [`StoreKeys`]: the key scheme for per-boundary entries
//! - [`NavigationCursor`]: current/next unit pointers

#![warn(unreachable_pub)]

mod cursor;
mod keys;
mod store;

pub use cursor::NavigationCursor;
pub use keys::StoreKeys;
pub use store::{MemoryStore, StateStore};
