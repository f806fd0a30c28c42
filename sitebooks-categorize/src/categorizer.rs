//! Model-backed categorizer.
//!
//! Outcome routing:
//! - reply parses and validates -> model prediction
//! - reply is non-empty but invalid -> fixed low-confidence placeholder
//! - no reply (transport, status, empty, missing key) -> keyword rules

use anyhow::{Context, Result, anyhow};
use sitebooks_core::{Category, CategoryPrediction, TransactionInput};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tracing::{debug, warn};

use crate::completion::{CompletionClient, CompletionError, CompletionRequest};
use crate::prompt::build_prompt;
use crate::rules::classify_by_rules;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            max_tokens: 500,
        }
    }
}

/// Result returned when the model answered with something that isn't a valid prediction.
pub fn unparsed_reply() -> CategoryPrediction {
    CategoryPrediction::new(
        Category::Other,
        "Uncategorized",
        0.1,
        "Failed to parse AI response",
    )
}

/// Strictly parse a model reply into a prediction.
pub fn parse_prediction(reply: &str) -> Result<CategoryPrediction, CompletionError> {
    let prediction: CategoryPrediction = serde_json::from_str(reply.trim())
        .map_err(|e| CompletionError::Malformed(e.to_string()))?;
    if !prediction.has_valid_confidence() {
        return Err(CompletionError::Malformed(format!(
            "confidence out of range: {}",
            prediction.confidence
        )));
    }
    Ok(prediction)
}

pub struct Categorizer<C> {
    client: C,
    settings: CompletionSettings,
}

impl<C: CompletionClient> Categorizer<C> {
    pub fn new(client: C, settings: CompletionSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    fn request_for(&self, txn: &TransactionInput) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            prompt: build_prompt(txn),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    /// Ask the model, without any recovery.
    pub async fn request_prediction(
        &self,
        txn: &TransactionInput,
    ) -> Result<CategoryPrediction, CompletionError> {
        let reply = self.client.complete(&self.request_for(txn)).await?;
        debug!(reply = %reply, "completion reply");
        parse_prediction(&reply)
    }

    /// Categorize one transaction. Always yields exactly one prediction.
    pub async fn classify(&self, txn: &TransactionInput) -> CategoryPrediction {
        match self.request_prediction(txn).await {
            Ok(prediction) => prediction,
            Err(CompletionError::Malformed(reason)) => {
                warn!(name = %txn.name, %reason, "unparseable categorization reply");
                unparsed_reply()
            }
            Err(
                e @ (CompletionError::MissingApiKey
                | CompletionError::Transport(_)
                | CompletionError::Status { .. }
                | CompletionError::Empty),
            ) => {
                warn!(name = %txn.name, error = %e, "AI categorization error, using keyword rules");
                classify_by_rules(txn)
            }
        }
    }

    /// Blocking wrapper for callers that cannot `.await`.
    ///
    /// Inside a multi-thread runtime the current worker is parked with
    /// `block_in_place`. A current-thread runtime cannot be blocked that way, so the
    /// call runs on a private runtime in a scoped thread instead.
    pub fn classify_blocking(&self, txn: &TransactionInput) -> Result<CategoryPrediction>
    where
        C: Sync,
    {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                Ok(tokio::task::block_in_place(|| handle.block_on(self.classify(txn))))
            }
            Ok(_) => std::thread::scope(|scope| {
                scope
                    .spawn(|| self.classify_on_new_runtime(txn))
                    .join()
                    .map_err(|_| anyhow!("categorizer thread panicked"))?
            }),
            Err(_) => self.classify_on_new_runtime(txn),
        }
    }

    fn classify_on_new_runtime(&self, txn: &TransactionInput) -> Result<CategoryPrediction> {
        let rt = Runtime::new().context("create tokio runtime")?;
        Ok(rt.block_on(self.classify(txn)))
    }
}
