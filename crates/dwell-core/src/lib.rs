//! Core domain logic for dwell-time tracking.
//!
//! This crate contains the fundamental types and logic for:
//! - Site classification: which URLs are never tracked, and which belong to the same site
//! - Timing: per-tab foreground time accumulation
//! - Sessions: the state machine that opens, updates and flushes visits

pub mod controller;
pub mod event;
pub mod registry;
pub mod sink;
pub mod site;
pub mod timer;
pub mod types;

pub use controller::{FlushStats, SessionController, SystemMode, TabState, TrackerConfig};
pub use event::{IdleState, LoadStatus, TabEvent, TabUpdate, TimedEvent};
pub use registry::{FinishedVisit, RegistryError, Visit, VisitRegistry};
pub use sink::{IdentitySource, VisitRecord, VisitSink};
pub use timer::TabTimer;
pub use types::{TabId, UserId, ValidationError};
