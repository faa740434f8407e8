//! crates/program_core/src/engine.rs
//!
//! The engine façade. Each component (tracker, completion, gate, sessions) adds its
//! operations to `ProgramEngine` in its own module.

use std::sync::Arc;

use crate::policy::{NoSkipPolicy, SkipPolicy};
use crate::ports::{AnswerProfileStore, SessionStore, VideoCatalog, WatchStore};

/// Wires the engine components to their collaborator ports.
#[derive(Clone)]
pub struct ProgramEngine {
    pub(crate) catalog: Arc<dyn VideoCatalog>,
    pub(crate) watches: Arc<dyn WatchStore>,
    pub(crate) sessions: Arc<dyn SessionStore>,
    pub(crate) profiles: Arc<dyn AnswerProfileStore>,
    pub(crate) skip_policy: Arc<dyn SkipPolicy>,
}

impl ProgramEngine {
    /// Creates an engine with the default `NoSkipPolicy`.
    pub fn new(
        catalog: Arc<dyn VideoCatalog>,
        watches: Arc<dyn WatchStore>,
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn AnswerProfileStore>,
    ) -> Self {
        Self {
            catalog,
            watches,
            sessions,
            profiles,
            skip_policy: Arc::new(NoSkipPolicy),
        }
    }

    pub fn with_skip_policy(mut self, policy: Arc<dyn SkipPolicy>) -> Self {
        self.skip_policy = policy;
        self
    }

    pub fn profiles(&self) -> &Arc<dyn AnswerProfileStore> {
        &self.profiles
    }
}
