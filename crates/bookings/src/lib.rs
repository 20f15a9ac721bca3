//! Bookings domain module.
//!
//! A booking reserves a number of player slots on a tee time for a golfer.
//! Placing and cancelling are decided here as pure functions over the tee
//! time aggregate; persisting them atomically is the infra layer's job.

pub mod booking;

pub use booking::{Booking, BookingDetail, PlaceBooking, PlayerCount};
