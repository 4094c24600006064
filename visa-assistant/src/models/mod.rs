//! Domain models for the visa assistant.

pub mod checklist;
pub mod conversation;
pub mod grounding;
pub mod session;

pub use checklist::{Checklist, ChecklistEntry, DEFAULT_CHECKLIST};
pub use conversation::{ConversationTurn, Message, Role, TurnRole};
pub use grounding::{Citation, GroundingChunk, GroundingMetadata, SearchEntryPoint, WebSource};
pub use session::{SessionState, Theme};
