//! Runtime infrastructure - Tokio runtime bridge for async operations

mod bridge;
pub mod refresh;
mod worker;

pub use bridge::{
    RuntimeBridge, RuntimeCommand, RuntimeEvent, WorkerConfig, WriteKind, WriteRequest, WriteStage,
};
pub use worker::{execute_write, run_async_worker, run_write};
