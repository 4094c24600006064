//! Consultation services.

pub mod checklist;
pub mod citations;
pub mod conversation;
pub mod export;
pub mod metrics;
pub mod providers;

pub use checklist::{derive_checklist, DerivedAnswer};
pub use citations::extract_citations;
pub use conversation::{ConversationService, TurnOutcome};
pub use export::{render_pdf, ChecklistLayout, ExportError};
pub use providers::{ProviderError, TextProvider};
