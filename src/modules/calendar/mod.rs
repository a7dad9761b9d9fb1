pub mod models;
pub mod repositories;
pub mod services;

pub use models::Credential;
pub use repositories::CredentialRepository;
pub use services::{CalendarSyncService, GoogleCalendarClient};
