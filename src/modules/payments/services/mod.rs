pub mod payment_service;
pub mod reconciler;

pub use payment_service::{PaymentIntent, PaymentService};
pub use reconciler::{CallbackReconciler, ReconciliationResult};
