// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service account login, run during the LogIn stage for servers that
//! asked for it.
//!
//! Credentials come from `CQC_SRVNAME`/`CQC_SRVPASS`, falling back to the
//! host secret store. The security service issues a challenge which is
//! answered with a proof derived from the password digest, and the
//! validated challenge is exchanged for a security token.

use std::time::Duration;

use async_trait::async_trait;
use cqc_core::StageOutcome;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::env;
use crate::hooks::{RetryInfo, StageError};

/// Wait before retrying when credentials are not configured yet.
pub const MISSING_CREDS_RETRY: Duration = Duration::from_secs(15);
/// Wait before retrying when the security service is unreachable.
pub const TRANSPORT_RETRY: Duration = Duration::from_secs(5);
/// Deadline for obtaining the security service client.
pub const LOGIN_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SecError {
    #[error("Security service unreachable: {0}")]
    Unreachable(String),

    #[error("Security service call timed out")]
    Timeout,

    #[error("Login rejected: {0}")]
    Rejected(String),
}

/// Challenge issued by the security service for one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecChallenge {
    pub nonce: Vec<u8>,
}

/// A challenge answered with the caller's proof of the account password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedChallenge {
    pub user: String,
    pub proof: Vec<u8>,
}

/// Security token granted after a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecToken {
    pub token: String,
}

/// Client to the platform security service.
#[async_trait]
pub trait SecurityClient: Send + Sync {
    /// Start a login, getting a challenge for the account.
    async fn login_request(&self, user: &str, deadline: Duration)
        -> Result<SecChallenge, SecError>;

    /// Exchange a validated challenge for a security token.
    async fn get_token(
        &self,
        validated: &ValidatedChallenge,
        deadline: Duration,
    ) -> Result<SecToken, SecError>;
}

/// Host secure storage holding the service account when the environment
/// does not provide it.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn server_credentials(&self) -> Option<(String, String)>;
}

/// Secret store for hosts with no secure storage configured.
pub struct NullSecretStore;

#[async_trait]
impl SecretStore for NullSecretStore {
    async fn server_credentials(&self) -> Option<(String, String)> {
        None
    }
}

/// Security client for hosts with no security service. Servers that ask
/// for login will retry forever against this; servers that do not never
/// touch it.
pub struct NullSecurityClient;

#[async_trait]
impl SecurityClient for NullSecurityClient {
    async fn login_request(
        &self,
        _user: &str,
        _deadline: Duration,
    ) -> Result<SecChallenge, SecError> {
        Err(SecError::Unreachable("no security service configured".into()))
    }

    async fn get_token(
        &self,
        _validated: &ValidatedChallenge,
        _deadline: Duration,
    ) -> Result<SecToken, SecError> {
        Err(SecError::Unreachable("no security service configured".into()))
    }
}

/// Login results shared with derived server code.
#[derive(Default)]
pub struct SessionCtx {
    token: Mutex<Option<SecToken>>,
    pw_hash: Mutex<Option<[u8; 32]>>,
}

impl SessionCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<SecToken> {
        self.token.lock().clone()
    }

    /// Digest of the service account password, kept because some derived
    /// servers need it for their own downstream calls.
    pub fn password_hash(&self) -> Option<[u8; 32]> {
        *self.pw_hash.lock()
    }

    fn store(&self, token: SecToken, pw_hash: [u8; 32]) {
        *self.token.lock() = Some(token);
        *self.pw_hash.lock() = Some(pw_hash);
    }
}

/// Digest of the account password.
pub fn hash_password(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

/// Proof for a challenge: digest of the nonce followed by the password
/// digest. Both ends compute the same value without the password ever
/// crossing the wire.
pub fn challenge_proof(nonce: &[u8], pw_hash: &[u8; 32]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(nonce);
    hasher.update(pw_hash);
    hasher.finalize().to_vec()
}

/// One login attempt. Success stores the token and password hash in the
/// session; failures ask the stage loop to retry.
pub(crate) async fn run_login(
    security: &dyn SecurityClient,
    secrets: &dyn SecretStore,
    session: &SessionCtx,
    retry: RetryInfo,
) -> Result<StageOutcome, StageError> {
    let creds = match env::server_credentials() {
        Some(creds) => Some(creds),
        None => secrets.server_credentials().await,
    };
    let Some((user, password)) = creds else {
        debug!(attempt = retry.count, "service credentials not configured yet");
        return Ok(StageOutcome::retry_in(MISSING_CREDS_RETRY));
    };

    let pw_hash = hash_password(&password);
    let attempt = async {
        let challenge = security.login_request(&user, LOGIN_DEADLINE).await?;
        let validated = ValidatedChallenge {
            user: user.clone(),
            proof: challenge_proof(&challenge.nonce, &pw_hash),
        };
        security.get_token(&validated, LOGIN_DEADLINE).await
    };

    match attempt.await {
        Ok(token) => {
            session.store(token, pw_hash);
            Ok(StageOutcome::Success)
        }
        Err(e) => {
            // One line per attempt, and only under diagnostic verbosity;
            // the peer is usually just still starting up.
            debug!(attempt = retry.count, user = %user, "login not possible yet: {}", e);
            Ok(StageOutcome::retry_in(TRANSPORT_RETRY))
        }
    }
}

#[cfg(test)]
#[path = "login_tests.rs"]
mod tests;
