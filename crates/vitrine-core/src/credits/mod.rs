//! Per-call credit gate.
//!
//! Every gated request carries a user access token, verified locally before
//! any work runs. One credit is spent at the profile store, in a single atomic
//! operation, once the request has succeeded.

pub mod auth;
pub mod store;

pub use auth::{bearer_token, Claims, TokenVerifier};
pub use store::{CreditOutcome, CreditStore, PostgrestCreditStore};

use std::sync::Arc;
use std::time::Duration;

use crate::config::{resolve_env_var, CreditsConfig};
use crate::error::{ConfigError, CreditError};

/// Token verification plus credit spending.
pub struct CreditGate {
    verifier: TokenVerifier,
    store: Arc<dyn CreditStore>,
}

impl CreditGate {
    pub fn new(verifier: TokenVerifier, store: Arc<dyn CreditStore>) -> Self {
        Self { verifier, store }
    }

    /// Build the gate against a PostgREST store, resolving `${ENV_VAR}` secrets.
    pub fn from_config(config: &CreditsConfig) -> Result<Self, ConfigError> {
        let required = |name: &str, value: &str| {
            resolve_env_var(value).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "credits.{name} is required when credits are enabled"
                ))
            })
        };
        let api_url = required("api_url", &config.api_url)?;
        let service_key = required("service_role_key", &config.service_role_key)?;
        let secret = required("jwt_secret", &config.jwt_secret)?;

        let store = PostgrestCreditStore::new(
            &api_url,
            &config.rpc_function,
            &service_key,
            Duration::from_millis(config.timeout_ms),
        )
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        tracing::info!("Credit gate enabled (store: {})", api_url);
        Ok(Self::new(
            TokenVerifier::new(&secret, &config.audience),
            Arc::new(store),
        ))
    }

    /// Check the `Authorization` header. Returns the user id.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<String, CreditError> {
        self.verifier.verify(bearer_token(authorization)?)
    }

    /// Spend one credit for `user_id`.
    pub async fn charge(&self, user_id: &str) -> Result<(), CreditError> {
        match self.store.consume(user_id).await? {
            CreditOutcome::Consumed { remaining } => {
                tracing::debug!(user_id = %user_id, remaining, "Credit consumed");
                Ok(())
            }
            CreditOutcome::Exhausted => Err(CreditError::Exhausted),
            CreditOutcome::UnknownUser => Err(CreditError::UnknownUser),
        }
    }
}
