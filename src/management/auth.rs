use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    config::{self, Settings},
    error::{Error, Result},
    spotify,
    types::Token,
};

/// Seconds before expiry at which a token is already treated as expired.
const EXPIRY_MARGIN_SECS: u64 = 240;

/// Source of bearer tokens for privileged calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a valid access token, refreshing it first when expired.
    async fn ensure_token_valid(&self) -> Result<String>;
}

/// Token persisted under the data directory, refreshed on demand.
pub struct TokenManager {
    token: Mutex<Token>,
    settings: Arc<Settings>,
}

impl TokenManager {
    pub fn new(token: Token, settings: Arc<Settings>) -> Self {
        TokenManager {
            token: Mutex::new(token),
            settings,
        }
    }

    pub async fn load(settings: Arc<Settings>) -> Result<Self> {
        let path = Self::token_path();
        let content = async_fs::read_to_string(&path).await.map_err(|e| {
            Error::auth(format!(
                "no token at {} ({}), run `spotsel auth` first",
                path.display(),
                e
            ))
        })?;
        let token: Token = serde_json::from_str(&content)?;
        Ok(Self::new(token, settings))
    }

    pub async fn persist(&self) -> Result<()> {
        let token = self.token.lock().await.clone();
        Self::write(&token).await
    }

    async fn write(token: &Token) -> Result<()> {
        let path = Self::token_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(token)?;
        async_fs::write(path, json).await?;
        Ok(())
    }

    pub async fn current_token(&self) -> Token {
        self.token.lock().await.clone()
    }

    fn is_expired(token: &Token) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + EXPIRY_MARGIN_SECS >= token.obtained_at + token.expires_in
    }

    fn token_path() -> PathBuf {
        config::data_dir().join("cache/token.json")
    }
}

#[async_trait]
impl TokenProvider for TokenManager {
    async fn ensure_token_valid(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if Self::is_expired(&token) {
            tracing::debug!("access token expired, refreshing");
            let fresh = spotify::auth::refresh_token(&self.settings, &token.refresh_token).await?;
            *token = fresh;
            if let Err(e) = Self::write(&token).await {
                tracing::warn!(error = %e, "failed to persist refreshed token");
            }
        }

        Ok(token.access_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(obtained_at: u64, expires_in: u64) -> Token {
        Token {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            scope: String::new(),
            expires_in,
            obtained_at,
        }
    }

    #[test]
    fn expiry_includes_margin() {
        let now = Utc::now().timestamp() as u64;
        assert!(!TokenManager::is_expired(&token(now, 3600)));
        assert!(TokenManager::is_expired(&token(now, 200)));
        assert!(TokenManager::is_expired(&token(now - 4000, 3600)));
    }
}
