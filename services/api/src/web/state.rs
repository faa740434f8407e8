//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use program_core::ProgramEngine;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: ProgramEngine,
    pub config: Arc<Config>,
}
