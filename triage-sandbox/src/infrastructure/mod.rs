//! Sandbox infrastructure: platform runners

pub mod process;
