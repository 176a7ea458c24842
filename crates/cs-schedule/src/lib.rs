//! `cs-schedule` — the engine's queues and the order events are consumed in.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`heap`]    | `BinaryHeap<T: Ord>` with `remove_at` and a sorted flag    |
//! | [`event`]   | `EventSubtype`, `EventGroup`, `TaskRank`, `TaskEvent`      |
//! | [`asap`]    | `AsapQueue` (most urgent last)                             |
//!
//! # Event order (summary)
//!
//! ```text
//! time ↑, subtype ↑, priority ↓, crew needed ↓, parallel count ↓,
//! task id ↑, arrival ↑, occurrence ↑
//! ```
//!
//! The ASAP queue uses the same order without the first two keys.

pub mod asap;
pub mod event;
pub mod heap;


pub use asap::AsapQueue;
pub use event::{EventGroup, EventSubtype, TaskEvent, TaskRank};
pub use heap::BinaryHeap;
