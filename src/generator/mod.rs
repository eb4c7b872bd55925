//! Game generation: template selection and the submit operation.
//!
//! - [`prompt`]: the two fixed templates and [`Mode`] selection
//! - [`controller`]: [`submit`] and the cache-bound [`Generator`]

pub mod controller;
pub mod prompt;

pub use controller::{CONFIRMATION, Generator, SubmitOutcome, submit};
pub use prompt::{Mode, build_prompt};
