pub mod notification;

pub use notification::{Notification, NotificationChannel, NotificationKind};
