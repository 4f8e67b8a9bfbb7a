use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::cache::{CacheBackend, CacheError};
use crate::certificate::Certificate;
use crate::crl::{CrlSyncEngine, RevocationStore};
use crate::crypto::{RingVerifier, SignatureVerifier};
use crate::rules::{RuleEngine, RulePolicy, RuleTable, Verdict, VerificationMode};
use crate::trust::{TrustList, TrustListError};

/// Errors raised while assembling a validator from cached resources.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Invalid rule table: {0}")]
    Rules(#[from] serde_json::Error),

    #[error("Invalid trust list: {0}")]
    TrustList(#[from] TrustListError),
}

pub type ValidatorResult<T> = Result<T, ValidatorError>;

/// Combines signature, revocation and rule checks into one verdict.
pub struct Validator<Store: CacheBackend, Revoked: RevocationStore, Verifier = RingVerifier> {
    rules: RuleEngine,
    trust_list: TrustList,
    crl: Arc<CrlSyncEngine<Store, Revoked>>,
    verifier: Verifier,
}

/// Missing artifacts are tolerated; everything else is an error.
fn optional<T>(result: Result<T, CacheError>) -> ValidatorResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CacheError::NotFound(key)) => {
            warn!("{} not cached yet", key);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

impl<Store, Revoked, Verifier> Validator<Store, Revoked, Verifier>
where
    Store: CacheBackend,
    Revoked: RevocationStore,
    Verifier: SignatureVerifier,
{
    pub fn new(
        rules: RuleEngine,
        trust_list: TrustList,
        crl: Arc<CrlSyncEngine<Store, Revoked>>,
        verifier: Verifier,
    ) -> Self {
        Self {
            rules,
            trust_list,
            crl,
            verifier,
        }
    }

    /// Builds a validator from the rules and signer certificates in the CRL engine's cache.
    pub async fn from_cache(
        crl: Arc<CrlSyncEngine<Store, Revoked>>,
        policy: RulePolicy,
        verifier: Verifier,
    ) -> ValidatorResult<Self> {
        let cache = crl.cache();

        let table = match optional(cache.rules().await)? {
            Some(data) => RuleTable::from_json(&data)?,
            None => RuleTable::default(),
        };
        let mut trust_list = match optional(cache.signatures().await)? {
            Some(data) => TrustList::from_json(&data)?,
            None => TrustList::new(),
        };
        if let Some(data) = optional(cache.signature_list().await)? {
            trust_list.retain_listed(&TrustList::parse_index(&data)?);
        }

        info!("Validator ready with {} signer keys", trust_list.len());
        Ok(Self::new(
            RuleEngine::new(table, policy),
            trust_list,
            crl,
            verifier,
        ))
    }

    pub fn rule_engine(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn trust_list(&self) -> &TrustList {
        &self.trust_list
    }

    /// True only when the signer is trusted, the signature verifies and the
    /// certificate is not revoked. Any failure reads as `false`.
    #[instrument(skip_all, fields(kid = %certificate.kid))]
    pub async fn check_signature(&self, certificate: &Certificate) -> bool {
        let Some(key) = self.trust_list.get(&certificate.kid) else {
            warn!("Unknown signer");
            return false;
        };
        if !self
            .verifier
            .verify(&certificate.signed_payload, &certificate.signature, key)
        {
            warn!("Signature verification failed");
            return false;
        }

        let Some(uvci) = certificate.uvci() else {
            return true;
        };
        match self.crl.is_revoked(uvci).await {
            Ok(revoked) => !revoked,
            Err(e) => {
                error!("Revocation lookup failed: {}", e);
                false
            }
        }
    }

    pub fn check_rules(&self, certificate: &Certificate, mode: VerificationMode) -> Verdict {
        self.check_rules_at(certificate, mode, Utc::now())
    }

    pub fn check_rules_at(
        &self,
        certificate: &Certificate,
        mode: VerificationMode,
        now: DateTime<Utc>,
    ) -> Verdict {
        self.rules.evaluate(certificate, now, mode)
    }

    /// Rule verdict whose `result` also requires a valid signature.
    pub async fn validate(&self, certificate: &Certificate, mode: VerificationMode) -> Verdict {
        self.validate_at(certificate, mode, Utc::now()).await
    }

    pub async fn validate_at(
        &self,
        certificate: &Certificate,
        mode: VerificationMode,
        now: DateTime<Utc>,
    ) -> Verdict {
        let verdict = self.check_rules_at(certificate, mode, now);
        let signature = self.check_signature(certificate).await;
        Verdict {
            result: verdict.result && signature,
            ..verdict
        }
    }
}
