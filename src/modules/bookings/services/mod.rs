pub mod availability;
pub mod booking_service;

pub use booking_service::{BookingService, CreateBookingRequest};
