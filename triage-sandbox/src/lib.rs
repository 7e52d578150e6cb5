//! Triage Sandbox - Isolated execution of inspection tools
//!
//! Every inspection tool runs as an opaque subprocess. The runner captures
//! stdout, stderr and the exit code uniformly and never raises: a tool that
//! times out, cannot be spawned or dies on a signal is recorded as a soft
//! failure with exit code `-1`.
//!
//! # Architecture
//!
//! | Layer | Contents |
//! |-------|----------|
//! | domain | [`ToolCommand`], [`SandboxPolicy`], the [`ToolRunner`] trait |
//! | infrastructure | [`ProcessToolRunner`] (tokio subprocess + rlimits on Linux) |
//! | application | [`ToolSequence`], running an ordered tool list against one file |
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use triage_core::domain::ToolSpec;
//! use triage_sandbox::{ProcessToolRunner, SandboxPolicy, ToolSequence};
//!
//! let sequence = ToolSequence::new(
//!     ToolSpec::default_set(),
//!     Arc::new(ProcessToolRunner::new()),
//!     SandboxPolicy::default(),
//! );
//! let outcomes = sequence.run_all(Path::new("sample.bin")).await;
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::sequence::ToolSequence;
pub use domain::command::ToolCommand;
pub use domain::policy::SandboxPolicy;
pub use domain::traits::{SandboxError, SandboxResult, ToolRunner};
pub use infrastructure::process::ProcessToolRunner;
