//! Identity Service implementations.

pub mod jwt;

pub use jwt::{Claims, JwtConfig, JwtIdentityService};
