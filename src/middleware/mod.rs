//! Request middleware.

pub mod auth;
pub mod request_id;

pub use auth::{auth_middleware, AuthContext};
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
