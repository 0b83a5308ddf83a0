//! Room / membership / message directory.

pub mod inmemory;
pub mod seed;

pub use inmemory::InMemoryDirectory;
pub use seed::{SeedData, SeedError};
