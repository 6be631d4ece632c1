//! Messaging between the analyzer window and its worker thread

pub mod messages;
pub mod worker;

pub use messages::{WorkerEvent, WorkerRequest};
pub use worker::AnalysisWorker;
