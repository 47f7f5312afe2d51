//! Pipeline orchestration and its response model.

pub mod orchestrator;
pub mod response;
pub mod state;

pub use orchestrator::{Pipeline, PipelineOptions, PipelineRequest, NOTHING_EXECUTED_NOTE};
pub use response::PipelineResponse;
pub use state::{PipelineState, TerminalStatus};
