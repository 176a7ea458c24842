//! `cs-dispatch` — who works on what.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                        |
//! |----------------|-----------------------------------------------------------------|
//! | [`context`]    | `AssignmentContext` — the engine state a dispatcher may touch   |
//! | [`dispatcher`] | `Dispatcher` trait, `ASSIGNMENT_FAILED` / `NEVER_EXPIRES`       |
//! | [`basic`]      | `BasicDispatcher` — score-based reference strategy              |
//! | [`error`]      | `DispatchError`, `DispatchResult<T>`                            |
//!
//! # Design notes
//!
//! The engine calls [`Dispatcher::task_assignment`] each time an occurrence
//! tries to (re)start, and [`Dispatcher::task_dismiss`] each time a staffed
//! occurrence stops.  A dispatcher never owns simulation state: everything it
//! reads or changes goes through the `&mut dyn AssignmentContext` it is
//! handed, which keeps the crew ↔ occurrence relation symmetric and lets the
//! dispatcher pre-empt running occurrences through
//! [`AssignmentContext::interrupt`].
//!
//! Dispatchers are `Send + Sync` so that one instance can serve replications
//! running on several threads.

pub mod basic;
pub mod context;
pub mod dispatcher;
pub mod error;

#[cfg(test)]
mod tests;

pub use basic::BasicDispatcher;
pub use context::AssignmentContext;
pub use dispatcher::{ASSIGNMENT_FAILED, Dispatcher, NEVER_EXPIRES};
pub use error::{DispatchError, DispatchResult};
