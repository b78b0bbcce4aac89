pub mod mail;
pub mod orchestrator;
pub mod preview;
pub mod telephony;
pub mod warehouse;

pub use orchestrator::{Orchestrator, SourceOutcome, SyncReport};
