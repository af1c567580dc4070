//! Discovery sessions: model, state machine, storage and orchestration

pub mod machine;
pub mod model;
pub mod orchestrator;
pub mod store;

pub use machine::{progress_update, transition};
pub use model::{
    CharacterType, DraftModifications, InteractionEvent, Session, SessionAction, SessionStep,
    SessionUpdate,
};
pub use orchestrator::{DiscoveryOrchestrator, SessionAnalytics};
pub use store::{MemorySessionStore, SessionStore};
