//! Workflow step sequencing, independent of the event bus

pub mod sequencer;
pub mod task;

pub use sequencer::StepSequencer;
pub use task::{sequence_from_names, StepStatus, StepTask};
