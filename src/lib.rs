//! Frontend: an HTTP front-end that forwards each request to a backend service.
//!
//! Every `GET /` triggers exactly one call to the configured backend. The
//! backend's payload is wrapped in a greeting on success; any failure yields
//! a fixed `500` error body.
//!
//! # Architecture
//!
//! - **Single route**: axum router serving `GET /`
//! - **No retries, no caching**: one downstream call per inbound request
//! - **Observable**: OTLP/gRPC trace and metric export, W3C trace context
//!   propagated from inbound requests through to the backend
//! - **Companion backend**: the `backend` binary serves `GET /work`, failing a
//!   configurable share of jobs and counting the rest in `processed_jobs_total`
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`error`]: Downstream and telemetry error types
//! - [`observability`]: Telemetry bootstrap, subscriber and HTTP instrumentation
//! - [`protocol`]: JSON response bodies
//! - [`server`]: Router construction and server lifecycle
//! - [`service`]: Request handlers and backend client

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // service::backend::BackendClient is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod config;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod server;
pub mod service;
