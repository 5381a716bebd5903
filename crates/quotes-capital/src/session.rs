//! Credential exchange and session token caching.

use chrono::{DateTime, Utc};
use quotes_config::CapitalSettings;
use quotes_core::{QuoteError, QuoteResult};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};

pub(crate) const HEADER_API_KEY: &str = "X-CAP-API-KEY";
pub(crate) const HEADER_CST: &str = "CST";
pub(crate) const HEADER_SECURITY_TOKEN: &str = "X-SECURITY-TOKEN";

/// Account credentials, read once from the environment.
///
/// Never logged, never serialized, never handed to callers.
#[derive(Clone)]
pub struct Credentials {
    pub identifier: String,
    pub api_key: String,
    pub password: String,
}

impl Credentials {
    /// Read credentials from the environment variables named in the settings.
    ///
    /// Any missing variable yields `AuthenticationFailed` naming it, so the
    /// first price request fails with a clear message instead of a panic.
    pub fn from_env(settings: &CapitalSettings) -> QuoteResult<Self> {
        let read = |var: &str| {
            std::env::var(var)
                .map_err(|_| QuoteError::AuthenticationFailed(format!("{var} is not set")))
        };

        Ok(Self {
            identifier: read(&settings.email_env)?,
            api_key: read(&settings.api_key_env)?,
            password: read(&settings.password_env)?,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("api_key", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An active upstream session: the paired opaque tokens returned by login.
#[derive(Debug, Clone)]
pub struct Session {
    pub cst: String,
    pub security_token: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

/// Owns the credential exchange with Capital.com and caches the resulting
/// session tokens for the lifetime of the process.
///
/// The session is either ABSENT or ACTIVE. Re-authenticating simply
/// overwrites the tokens with equally valid ones, so concurrent callers
/// racing to authenticate are tolerated and the lock is never held across
/// an await point.
pub struct SessionManager {
    settings: CapitalSettings,
    credentials: Option<Credentials>,
    http: Client,
    session: RwLock<Option<Session>>,
}

impl SessionManager {
    /// Create a session manager. `credentials` may be absent; every
    /// authenticated operation will then fail with `AuthenticationFailed`
    /// without issuing a request.
    pub fn new(settings: CapitalSettings, credentials: Option<Credentials>) -> QuoteResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| QuoteError::Transport(e.to_string()))?;

        Ok(Self {
            settings,
            credentials,
            http,
            session: RwLock::new(None),
        })
    }

    /// Exchange credentials for a fresh pair of session tokens.
    ///
    /// A single login request, no retry, no backoff. On any failure the
    /// session stays ABSENT and the error is returned as data.
    pub async fn authenticate(&self) -> QuoteResult<()> {
        let credentials = self.require_credentials()?;

        let url = format!("{}/session", self.settings.base_url);
        let body = LoginRequest {
            identifier: &credentials.identifier,
            password: &credentials.password,
        };

        debug!("logging in to {url}");
        let resp = self
            .http
            .post(&url)
            .header(HEADER_API_KEY, &credentials.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| QuoteError::AuthenticationFailed(format!("login request failed: {e}")))?;

        if resp.status() != StatusCode::OK {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(QuoteError::AuthenticationFailed(format!(
                "login rejected with HTTP {status}: {text}"
            )));
        }

        let session = Session {
            cst: response_header(&resp, HEADER_CST)?,
            security_token: response_header(&resp, HEADER_SECURITY_TOKEN)?,
            created_at: Utc::now(),
        };
        self.store_session(session);
        info!("Capital.com session established");
        Ok(())
    }

    /// True iff both session tokens are present.
    pub fn is_authenticated(&self) -> bool {
        self.session.read().unwrap().is_some()
    }

    /// The three headers every authenticated call must carry.
    pub(crate) fn request_headers(&self) -> QuoteResult<HeaderMap> {
        let credentials = self.require_credentials()?;
        let guard = self.session.read().unwrap();
        let session = guard
            .as_ref()
            .ok_or_else(|| QuoteError::AuthenticationFailed("no active session".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(HEADER_API_KEY, header_value(&credentials.api_key)?);
        headers.insert(HEADER_CST, header_value(&session.cst)?);
        headers.insert(HEADER_SECURITY_TOKEN, header_value(&session.security_token)?);
        Ok(headers)
    }

    fn require_credentials(&self) -> QuoteResult<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            QuoteError::AuthenticationFailed(
                "credentials not configured; set CAPITAL_EMAIL, CAPITAL_API_KEY and \
                 CAPITAL_PASSWORD"
                    .to_string(),
            )
        })
    }

    fn store_session(&self, session: Session) {
        *self.session.write().unwrap() = Some(session);
    }
}

fn response_header(resp: &reqwest::Response, name: &str) -> QuoteResult<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| {
            QuoteError::AuthenticationFailed(format!("login response missing {name} header"))
        })
}

fn header_value(value: &str) -> QuoteResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| QuoteError::AuthenticationFailed(format!("invalid header value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(credentials: Option<Credentials>) -> SessionManager {
        SessionManager::new(CapitalSettings::default(), credentials).unwrap()
    }

    fn session(tag: &str) -> Session {
        Session {
            cst: format!("cst-{tag}"),
            security_token: format!("sec-{tag}"),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn authenticate_without_credentials_fails_before_any_request() {
        let manager = manager(None);
        let err = manager.authenticate().await.unwrap_err();
        assert!(matches!(err, QuoteError::AuthenticationFailed(_)));
        assert!(!manager.is_authenticated());
    }

    #[test]
    fn starts_in_absent_state() {
        assert!(!manager(None).is_authenticated());
    }

    #[test]
    fn token_overwrite_keeps_session_active() {
        let credentials = Credentials {
            identifier: "trader@example.com".to_string(),
            api_key: "key".to_string(),
            password: "pw".to_string(),
        };
        let manager = manager(Some(credentials));

        manager.store_session(session("first"));
        assert!(manager.is_authenticated());

        // a second login overwrites with equally valid tokens
        manager.store_session(session("second"));
        assert!(manager.is_authenticated());
        let headers = manager.request_headers().unwrap();
        assert_eq!(headers[HEADER_CST], "cst-second");
        assert_eq!(headers[HEADER_SECURITY_TOKEN], "sec-second");
    }

    #[test]
    fn request_headers_require_an_active_session() {
        let credentials = Credentials {
            identifier: "trader@example.com".to_string(),
            api_key: "key".to_string(),
            password: "pw".to_string(),
        };
        let manager = manager(Some(credentials));
        let err = manager.request_headers().unwrap_err();
        assert!(matches!(err, QuoteError::AuthenticationFailed(_)));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credentials = Credentials {
            identifier: "trader@example.com".to_string(),
            api_key: "topsecretkey".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("topsecretkey"));
        assert!(!rendered.contains("hunter2"));
    }
}
