//! Profile store access: one atomic credit decrement per call.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CreditError;

/// Result of trying to spend one credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    /// One credit was spent; `remaining` is what is left.
    Consumed { remaining: i64 },
    /// The user exists but has no credits.
    Exhausted,
    /// No profile for this user.
    UnknownUser,
}

/// Somewhere credits are kept.
///
/// Implementations must decrement atomically: the check and the update are
/// one operation at the store.
#[async_trait]
pub trait CreditStore: Send + Sync {
    async fn consume(&self, user_id: &str) -> Result<CreditOutcome, CreditError>;
}

/// Calls a PostgREST stored function that does
/// `UPDATE profiles SET credits = credits - 1 WHERE user_id = $1 AND credits > 0`.
pub struct PostgrestCreditStore {
    client: reqwest::Client,
    rpc_url: String,
    service_key: String,
}

#[derive(Serialize)]
struct ConsumeRequest<'a> {
    p_user_id: &'a str,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum ConsumeStatus {
    Consumed,
    Exhausted,
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ConsumeResponse {
    status: ConsumeStatus,
    #[serde(default)]
    remaining: i64,
}

/// PostgREST returns either the object or a one-row array depending on the
/// function's declared return type.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConsumeBody {
    One(ConsumeResponse),
    Rows(Vec<ConsumeResponse>),
}

impl PostgrestCreditStore {
    pub fn new(
        api_url: &str,
        rpc_function: &str,
        service_key: &str,
        timeout: Duration,
    ) -> Result<Self, CreditError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CreditError::Upstream(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            rpc_url: format!("{}/rpc/{}", api_url.trim_end_matches('/'), rpc_function),
            service_key: service_key.to_string(),
        })
    }
}

#[async_trait]
impl CreditStore for PostgrestCreditStore {
    async fn consume(&self, user_id: &str) -> Result<CreditOutcome, CreditError> {
        let resp = self
            .client
            .post(&self.rpc_url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&ConsumeRequest { p_user_id: user_id })
            .send()
            .await
            .map_err(|e| CreditError::Upstream(format!("Credit store request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(CreditError::Upstream(format!(
                "Credit store HTTP {status}: {text}"
            )));
        }

        let body: ConsumeBody = resp
            .json()
            .await
            .map_err(|e| CreditError::Upstream(format!("Unexpected credit store response: {e}")))?;
        let outcome = match body {
            ConsumeBody::One(r) => r,
            ConsumeBody::Rows(rows) => rows.into_iter().next().ok_or_else(|| {
                CreditError::Upstream("Credit store returned no rows".to_string())
            })?,
        };

        Ok(match outcome.status {
            ConsumeStatus::Consumed => CreditOutcome::Consumed {
                remaining: outcome.remaining,
            },
            ConsumeStatus::Exhausted => CreditOutcome::Exhausted,
            ConsumeStatus::Unknown => CreditOutcome::UnknownUser,
        })
    }
}
