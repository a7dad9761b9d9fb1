pub mod controllers;
pub mod models;
pub mod repositories;

pub use models::{WebhookEvent, WebhookSource};
pub use repositories::WebhookEventRepository;
