pub mod orchestrator;

pub use orchestrator::{
    ArtifactFailure, CancelHandle, NoProgress, ProgressSink, SyncOrchestrator, SyncReport,
    SyncStatus,
};
