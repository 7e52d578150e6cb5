//! Triage Orchestrator - Analysis job pipeline and HTTP API
//!
//! This crate owns the lifecycle of every submission: it registers jobs,
//! schedules them on a bounded worker pool, runs the configured inspection
//! tools through `triage-sandbox` and serves the resulting bundles.
//!
//! # Job lifecycle
//!
//! ```text
//! pending ──► running ──► completed
//!    ▲           │
//!    │           └──────► failed
//!    └──── restart ◄──── (completed | failed)
//! ```
//!
//! # Architecture
//!
//! ```text
//! triage-orchestrator/
//! ├── presentation/     # HTTP layer
//! │   ├── controllers/  # Request handlers
//! │   ├── models.rs     # DTOs with OpenAPI schemas
//! │   └── routes.rs     # API route definitions
//! ├── application/      # Executor, orchestrator, resolver, workflow
//! ├── infrastructure/   # Job stores, worker pool, on-disk layout
//! └── domain/           # AnalysisJob and its state machine
//! ```
//!
//! # API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/upload` | POST | Submit a file for analysis |
//! | `/files` | GET | List analyses, most recent first |
//! | `/files/{id}` | GET | Get one analysis |
//! | `/files/{id}/results` | GET | Get the result bundle of a completed analysis |
//! | `/files/{id}/restart` | POST | Run a finished analysis again |
//! | `/interactive` | POST | Create a placeholder interactive session |
//! | `/files/{id}/session` | GET | Session details of an interactive job |
//! | `/health` | GET | Health check |

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
