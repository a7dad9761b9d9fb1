pub mod controllers;
pub mod models;
pub mod providers;
pub mod repositories;
pub mod services;

pub use models::{Payment, PaymentMethod, PaymentStatus};
pub use providers::{
    CallbackContext, CallbackOutcome, CashProvider, ChargeRequest, PaymentProvider,
    ProviderCharge, ProviderSet, StripeProvider, VnpayProvider,
};
pub use repositories::PaymentRepository;
pub use services::{CallbackReconciler, PaymentIntent, PaymentService, ReconciliationResult};
