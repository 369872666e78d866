//! Chat relay core: spam classification, team affiliation, delivery routing
//! and the execution-context guard that keeps rendering on its own context.
//!
//! Everything the relay does not own (participants, session state, the
//! transport, moderation and rendering) is reached through the traits in
//! [`participant`], [`session`], [`transport`], [`moderation`] and [`render`].

pub mod affiliation;
pub mod chat_log;
pub mod config;
pub mod context;
pub mod error;
pub mod moderation;
pub mod participant;
pub mod render;
pub mod router;
pub mod session;
pub mod spam;
pub mod transport;

pub use config::RelayConfig;
pub use context::{ContextGuard, Dispatch, JobPump, PrivilegedScope, job_queue};
pub use error::RelayError;
pub use router::{Collaborators, DeliveryRouter, InboundMessage, SendOutcome, SendRequest};
pub use spam::{SpamClassifier, SpamRuleSet, SpamVerdict};
