use std::sync::Arc;
use std::time::Instant;

use vitrine_core::{CreditGate, Vitrine};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Loaded models, index and catalog
    pub vitrine: Arc<Vitrine>,

    /// Credit gate; `None` serves the ungated API
    pub gate: Option<Arc<CreditGate>>,

    /// Process start, for uptime
    pub started: Instant,
}

impl AppState {
    pub fn new(vitrine: Arc<Vitrine>, gate: Option<Arc<CreditGate>>) -> Self {
        Self {
            vitrine,
            gate,
            started: Instant::now(),
        }
    }
}
