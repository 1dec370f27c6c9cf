//! # foia-dispatch
//!
//! Queue worker that delivers FOIA requests to agency components.
//!
//! Each queued request is routed to a submission channel chosen by its
//! agency component. Successful deliveries clean up the original webform
//! submission; failures are retried a bounded number of times before the
//! request is marked failed for an operator to look at.

pub mod channel;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;
pub mod telemetry;
