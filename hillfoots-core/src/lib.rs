//! Core types for the East Hillfoots parish calendar.
//!
//! - `event` and `recurrence`: event definitions and their expansion into
//!   dated occurrences
//! - `normalize`: turning loosely-typed spreadsheet rows into records
//! - `store`: local persistence of synced collections
//! - `ics`, `links` and `summary`: outputs built from occurrences

pub mod assistant;
pub mod config;
pub mod date_range;
pub mod error;
pub mod event;
pub mod ics;
pub mod links;
pub mod model;
pub mod normalize;
pub mod recurrence;
pub mod store;
pub mod summary;
pub mod time;

pub use error::{ParishError, ParishResult};
pub use event::*;
pub use recurrence::{Expansion, expand, expand_with_report};
pub use store::{Collection, Store};
