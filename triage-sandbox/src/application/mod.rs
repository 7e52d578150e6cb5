//! Sandbox application layer

pub mod sequence;
