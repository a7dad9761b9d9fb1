pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Notification, NotificationChannel, NotificationKind};
pub use repositories::NotificationRepository;
pub use services::NotificationService;
