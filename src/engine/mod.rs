//! Dispatch engine: retry policy, outcome handling, the worker, and the queue loop.

pub mod control;
pub mod handler;
pub mod policy;
pub mod worker;

pub use control::{ControlConfig, ControlPlane, MessageAction};
pub use handler::{Disposition, OutcomeHandler};
pub use policy::{Decision, FailurePolicy};
pub use worker::{QueueItem, SubmissionWorker};
