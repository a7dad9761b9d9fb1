pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Booking, BookingStatus, ExternalSession};
pub use repositories::{BookingRepository, ExternalSessionRepository};
pub use services::{BookingService, CreateBookingRequest};
