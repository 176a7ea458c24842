//! `cs-core` — foundational types for the `crewsim` manning simulator.
//!
//! This crate is a dependency of every other `cs-*` crate.  It has no `cs-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module           | Contents                                             |
//! |------------------|------------------------------------------------------|
//! | [`ids`]          | `TaskId`, `CrewmanId`, `PhaseId`, `OccurrenceId`     |
//! | [`time`]         | `SimTime`, `TimeUnit`, calendar residues             |
//! | [`distribution`] | `TimeDistribution` (constant/exponential/triangular) |
//! | [`code`]         | `TypeCode` and the decimal sub-code hierarchy        |
//! | [`rng`]          | `SimRng` (per replication)                           |
//! | [`config`]       | `RunConfig`                                          |
//! | [`error`]        | `CoreError`, `CoreResult`                            |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public value types.  |

pub mod code;
pub mod config;
pub mod distribution;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use code::TypeCode;
pub use config::RunConfig;
pub use distribution::{DistributionKind, TimeDistribution};
pub use error::{CoreError, CoreResult};
pub use ids::{CrewmanId, OccurrenceId, PhaseId, TaskId};
pub use rng::SimRng;
pub use time::{SimTime, TimeUnit};
