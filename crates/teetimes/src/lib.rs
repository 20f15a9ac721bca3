//! Tee sheet domain module.
//!
//! A tee time is a bookable start slot with a fixed player capacity. This
//! crate owns the slot accounting decisions (reserve / release) as pure,
//! deterministic logic (no IO, no HTTP, no storage).

pub mod tee_time;

pub use tee_time::{
    DEFAULT_CAPACITY, DEFAULT_COURSE_SECTION, RescheduleTeeTime, ScheduleTeeTime, TeeTime,
};
