//! `cs-sim` — discrete-event engine for the crewsim workspace.
//!
//! # Replication loop
//!
//! ```text
//! prepare: reset crew, sample task offsets, enqueue tasks that do not
//!          depend on a phase
//! for phase in scenario:
//!   ① Transition  — every pending occurrence is carried over or dropped
//!                   according to its phase-interruption policy.
//!   ② Duration    — an obligatory occurrence holds the phase open for its
//!                   sampled length.
//!   ③ Enqueue     — phase-dependent tasks (by phase type, then the
//!                   phase-specific ones).
//!   ④ Consume     — pop events in time order while obligatory occurrences
//!                   remain; each one may call the Dispatcher.
//! final transition: scenario-interruption policies apply
//! ```
//!
//! | Module        | Contents                                            |
//! |---------------|-----------------------------------------------------|
//! | `builder`     | [`SimBuilder`]: expansion and preparation           |
//! | `sim`         | [`Simulator`]: data set plus engine state           |
//! | `replication` | Event consumption and phase transitions             |
//! | `runner`      | [`run_replications`]: seeded multi-replication runs |
//! | `observer`    | [`SimObserver`] callbacks                           |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Runs replications on Rayon's thread pool.               |
//! | `fx-hash`  | FxHash for the active-task set.                         |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use cs_core::{RunConfig, SimTime};
//! use cs_dispatch::BasicDispatcher;
//! use cs_sim::{NoopObserver, SimBuilder, run_replications};
//!
//! let sim = SimBuilder::new(data).build()?;
//! let config = RunConfig { replications: 10, ..RunConfig::default() };
//! let outcomes = run_replications(&sim, &config, &BasicDispatcher::default(), |_| NoopObserver)?;
//! assert!(outcomes.iter().all(|o| o.success));
//! ```

pub mod builder;
pub mod error;
pub mod observer;
mod replication;
pub mod runner;
pub mod sim;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use runner::{ReplicationOutcome, run_replications};
pub use sim::Simulator;
