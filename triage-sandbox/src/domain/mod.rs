//! Sandbox domain layer

pub mod command;
pub mod policy;
pub mod traits;
