pub mod receiver_controller;

pub use receiver_controller::configure;
