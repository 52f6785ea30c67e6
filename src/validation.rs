//! Validation cache and service
//!
//! Phone/email verdicts from third-party APIs are cached under the same
//! key-derivation and expiration discipline as cart records, so a repeat
//! checkout attempt does not hit the upstream again. Storage is bounded:
//! writes past the configured cap are rejected rather than evicted.
use crate::config::CartConfig;
use crate::error::CartError;
use crate::keys::{Resource as KeyResource, derive_key};
use crate::store::{KvStore, encode};
use std::sync::Arc;

/// Cached outcome of an upstream validation call. `error` is the message to
/// replay to the client, or `None` when the value validated cleanly.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    #[n(0)]
    pub error: Option<String>,
}

/// What is being validated and with which options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Email { allow_disposable: bool },
    Phone { country: Option<String> },
}

/// Seam to the external validation APIs. Implementations wrap the upstream
/// HTTP call and return `ValidationViolation` for a definitive "no",
/// `ServiceUnavailable` when the upstream cannot answer.
pub trait Validator: Send + Sync {
    fn validate(&self, resource: &Resource, value: &str) -> Result<(), CartError>;
}

pub struct ValidationCache {
    store: Arc<dyn KvStore>,
    config: CartConfig,
}

impl ValidationCache {
    pub fn new(store: Arc<dyn KvStore>, config: CartConfig) -> Self {
        Self { store, config }
    }

    fn entry_key(&self, value: &str) -> String {
        derive_key(
            &self.config.namespace,
            self.config.environment,
            KeyResource::Validation,
            value,
        )
    }

    /// Cached verdict for a value, refreshing its expiration on hit.
    pub fn has_entry(&self, value: &str) -> Result<Option<Verdict>, CartError> {
        if value.is_empty() {
            return Err(CartError::ValidationViolation("Value must be provided".into()));
        }

        match self
            .store
            .get_ex(&self.entry_key(value), self.config.validation_ttl)?
        {
            Some(raw) => Ok(Some(
                minicbor::decode(&raw).map_err(crate::error::StoreError::from)?,
            )),
            None => Ok(None),
        }
    }

    /// Store a verdict, rejecting the write once the namespace holds the
    /// configured maximum number of entries. The count is a linear scan of
    /// live keys under the prefix, acceptable because the cap is small and
    /// the store is external.
    pub fn save_entry(&self, value: &str, verdict: &Verdict) -> Result<(), CartError> {
        if value.is_empty() {
            return Err(CartError::ValidationViolation("Key must be provided".into()));
        }

        let existing = self.store.keys_with_prefix(&self.config.key_prefix())?;

        if existing.len() >= self.config.max_validation_entries {
            tracing::warn!(
                count = existing.len(),
                max = self.config.max_validation_entries,
                "validation cache full, rejecting write"
            );
            return Err(CartError::CapacityExceeded);
        }

        self.store.set_ex(
            &self.entry_key(value),
            &encode(verdict)?,
            self.config.validation_ttl,
        )?;

        Ok(())
    }
}

pub struct ValidationService {
    cache: ValidationCache,
    validator: Arc<dyn Validator>,
}

impl ValidationService {
    pub fn new(cache: ValidationCache, validator: Arc<dyn Validator>) -> Self {
        Self { cache, validator }
    }

    /// Validate a value, replaying a cached verdict when one exists.
    /// Definitive outcomes (clean or violation) are cached; upstream
    /// unavailability is not, so the next attempt retries the API.
    pub fn validate(&self, resource: &Resource, value: &str) -> Result<(), CartError> {
        if let Some(verdict) = self.cache.has_entry(value)? {
            return match verdict.error {
                Some(message) => Err(CartError::ValidationViolation(message)),
                None => Ok(()),
            };
        }

        let outcome = self.validator.validate(resource, value);

        let verdict = match &outcome {
            Ok(()) => Verdict { error: None },
            Err(CartError::ValidationViolation(message)) => Verdict {
                error: Some(message.clone()),
            },
            // transient upstream failures are surfaced but never cached
            Err(_) => return outcome,
        };

        // caching is best-effort; a full cache must not fail the checkout
        if let Err(err) = self.cache.save_entry(value, &verdict) {
            tracing::warn!(error = %err, "failed to cache validation verdict");
        }

        outcome
    }
}
