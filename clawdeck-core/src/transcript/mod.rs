//! Transcript pipeline: reading, classifying and reconstructing
//!
//! Data flows one direction through this module:
//!
//! ```text
//! ┌────────────────┐    ┌────────────────┐    ┌──────────────────────┐
//! │ reader         │ ─► │ classify       │ ─► │ session / activity   │
//! │ (*.jsonl on    │    │ (tool call →   │    │ (Session summaries,  │
//! │  disk)         │    │  typed title)  │    │  derived Activities) │
//! └────────────────┘    └────────────────┘    └──────────────────────┘
//! ```
//!
//! Everything here is a pure read path: derived values are recomputed per
//! call and never persisted. Failures degrade to smaller results (empty
//! file, skipped line), never to errors.

pub mod activity;
pub mod classify;
pub mod reader;
pub mod record;
pub mod session;

pub use activity::{derive_activities, TranscriptQuery};
pub use classify::{classify, Classified};
pub use reader::{read_records, session_files, session_files_since, SessionFile};
pub use record::{RawContent, RawCost, RawMessage, RawPart, RawRecord, RawUsage};
pub use session::{inbox, list_sessions, reconstruct, session_messages};
