//! Triage Core - Foundation crate for the triage analysis service
//!
//! Shared functionality used by the sandbox, the orchestrator and the
//! standalone CLI:
//!
//! # Modules
//!
//! - [`config`] - Strongly-typed configuration with TOML and environment variable support
//! - [`domain`] - Tool specifications, tool outcomes, fingerprints and the result bundle
//! - [`infrastructure`] - Fingerprinting and the on-disk result bundle store
//! - [`logging`] - Structured logging with tracing
//!
//! # Configuration
//!
//! ```rust,ignore
//! use triage_core::Config;
//!
//! let config = Config::load()?;
//! ```
//!
//! Environment variables use the `TRIAGE__` prefix with double underscore separators:
//!
//! ```bash
//! TRIAGE__SERVER__PORT=8000
//! TRIAGE__ANALYSIS__TOOL_TIMEOUT_SECONDS=30
//! ```

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
