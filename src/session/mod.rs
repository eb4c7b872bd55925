//! Session state: conversation, current game, and the store that owns them.
//!
//! Sessions live in memory for the lifetime of the process. Each one is
//! identified by a UUID and handed to request handlers as a
//! [`SharedSession`], locked for the duration of a submission.
//!
//! # Architecture
//!
//! - [`GameSession`]: conversation turns plus the current [`Artifact`]
//! - [`SessionStore`]: thread-safe map of all active sessions
//!
//! # Example
//!
//! ```rust
//! use game_forge::session::{Role, SessionStore};
//!
//! let store = SessionStore::new();
//! let (id, session) = store.create("qwen-3-235b-a22b-instruct-2507");
//! let mut guard = session.try_lock().unwrap();
//! guard.add_user_turn("A platformer where a cat jumps over lava");
//!
//! assert_eq!(guard.turns()[0].role, Role::User);
//! assert!(store.get(&id).is_some());
//! ```

mod artifact;
mod thread;

pub use artifact::{Artifact, HTML_MARKER, contains_html_marker};
pub use thread::{GameSession, Role, SessionStore, SharedSession, Turn};
