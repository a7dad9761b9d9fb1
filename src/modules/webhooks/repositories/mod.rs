pub mod webhook_event_repository;

pub use webhook_event_repository::WebhookEventRepository;
