//! Golfer directory domain module.
//!
//! This crate contains the rules for golfer profiles (customer identities),
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod email;
pub mod golfer;

pub use email::Email;
pub use golfer::{Golfer, RegisterGolfer, UpdateGolfer};
