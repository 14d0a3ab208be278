//! Asynchronous document processing.
//!
//! A submission is accepted synchronously by [`FileIntake`] and analyzed in
//! a detached tokio task by [`ProcessingPipeline`]. Every document moves
//! from `Processing` to exactly one of `Analyzed` or `Failed`.

mod intake;
mod processor;
mod view;

pub use intake::FileIntake;
pub use processor::{Accepted, PipelineBuilder, ProcessingPipeline, UNSPECIFIED_ITEM};
pub use view::{
    DocumentDetails, DocumentView, LineView, Submission, FAILED_MESSAGE, PROCESSING_MESSAGE,
};
