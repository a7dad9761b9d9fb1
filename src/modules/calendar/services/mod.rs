pub mod gcal_client;
pub mod sync_service;

pub use gcal_client::GoogleCalendarClient;
pub use sync_service::CalendarSyncService;
