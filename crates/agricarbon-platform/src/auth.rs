use std::collections::HashMap;

use agricarbon_core::{Authenticator, Principal};
use anyhow::{Result, bail};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};

/// Returns the credential from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Looks tokens up in `api_sessions` by digest. Raw tokens are never stored.
#[derive(Clone)]
pub struct PgSessionAuthenticator {
    pool: PgPool,
}

impl PgSessionAuthenticator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Authenticator for PgSessionAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Option<Principal>> {
        let row = sqlx::query(
            r#"
            SELECT owner
            FROM api_sessions
            WHERE token_sha256 = $1
              AND expires_at > now()
            "#,
        )
        .bind(token_digest(token))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Principal::new(row.try_get::<String, _>("owner")?))),
            None => Ok(None),
        }
    }
}

/// Fixed token table, for local runs and tests.
#[derive(Clone, Debug, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuthenticator {
    /// Parses `token=owner` pairs separated by commas.
    pub fn parse(tokens: &str) -> Result<Self> {
        let mut authenticator = Self::default();
        for entry in tokens.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let Some((token, owner)) = entry.split_once('=') else {
                bail!("API_TOKENS entry '{entry}' must look like token=owner");
            };
            let (token, owner) = (token.trim(), owner.trim());
            if token.is_empty() || owner.is_empty() {
                bail!("API_TOKENS entry '{entry}' has an empty token or owner");
            }
            authenticator = authenticator.with_token(token, owner);
        }

        if authenticator.tokens.is_empty() {
            bail!("API_TOKENS does not contain any token");
        }

        Ok(authenticator)
    }

    pub fn with_token(mut self, token: impl Into<String>, owner: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), owner.into());
        self
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Option<Principal>> {
        Ok(self.tokens.get(token).map(Principal::new))
    }
}
