pub mod auth;
pub mod request_id;

pub use auth::AuthContext;
pub use request_id::RequestId;
