//! Infrastructure layer: concrete implementations of the domain interfaces
//! and the wire DTOs.

pub mod directory;
pub mod dto;
pub mod identity;
pub mod rate_limiter;
pub mod registry;
