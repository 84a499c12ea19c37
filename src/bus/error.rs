use thiserror::Error;

/// Errors raised by the event bus
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A publish was attempted while `depth` publish rounds were already
    /// open on the dispatching thread. Almost always a re-publish cycle
    /// between listeners.
    #[error("publish of '{event}' on scope '{scope}' refused at depth {depth} (limit {limit})")]
    DepthExceeded {
        scope: String,
        event: String,
        depth: usize,
        limit: usize,
    },
}
