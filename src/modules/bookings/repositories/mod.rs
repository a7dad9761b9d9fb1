pub mod booking_repository;
pub mod external_session_repository;

pub use booking_repository::BookingRepository;
pub use external_session_repository::ExternalSessionRepository;
