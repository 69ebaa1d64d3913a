//! Authentication: token signing and password hashing.

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtKeys};
pub use password::PasswordService;
