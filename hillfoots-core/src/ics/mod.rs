//! ICS export of expanded occurrences.
//!
//! Each occurrence becomes its own VEVENT with floating (zone-less) times, so
//! calendar clients show the same wall-clock time the parish published.

mod generate;

pub use generate::{PRODID, generate_ics, occurrence_uid};
