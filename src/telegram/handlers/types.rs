//! Handler types and dependencies

use std::sync::Arc;

use crate::relay::RelayService;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub service: Arc<RelayService>,
    pub bot_username: Option<String>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(service: Arc<RelayService>, bot_username: Option<String>) -> Self {
        Self { service, bot_username }
    }
}
