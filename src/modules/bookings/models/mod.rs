pub mod booking;
pub mod external_session;

pub use booking::{Booking, BookingStatus};
pub use external_session::ExternalSession;
