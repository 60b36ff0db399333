//! CAS login handshake.
//!
//! The negotiator walks `Init -> KeyFetched -> Submitted -> Redirecting(k) ->
//! Settled -> Validated`; any failure ends the walk with a [`SessionError`]. Each
//! state can be entered directly with [`SessionNegotiator::with_state`] so a single
//! transition can be exercised against a scripted transport.

pub mod cipher;
pub mod form;

use reqwest::Url;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::cipher::{KeyExchangeError, PublicKey};
use crate::auth::form::hidden_input_value;
use crate::config::{Config, RequiredCookie};
use crate::portal::retry::{RetryPolicy, Retryable};
use crate::portal::{PortalTransport, RequestKind, TransportError};

const EXECUTION_FIELD: &str = "execution";

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("login page returned status {0}")]
    LoginPageStatus(u16),
    #[error("login page has no execution token")]
    MissingExecutionToken,
    #[error("public key exchange failed: {0}")]
    KeyExchange(#[from] KeyExchangeError),
    #[error("login submission returned unexpected status {0}")]
    UnexpectedStatus(u16),
    #[error("redirect hop {hop} to {url} returned status {status}")]
    RedirectStatus { hop: usize, url: String, status: u16 },
    #[error("redirect target is not a valid URL: {0}")]
    InvalidRedirect(String),
    #[error("redirected to error page: {0}")]
    ErrorPage(String),
    #[error("redirect chain did not settle within {0} hops")]
    RedirectLimit(usize),
    #[error("session cookie {0} missing after login")]
    MissingCookie(String),
}

impl Retryable for SessionError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::LoginPageStatus(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Init,
    KeyFetched {
        execution: String,
        encrypted_password: String,
    },
    Submitted {
        location: Option<String>,
    },
    Redirecting {
        hop: usize,
        next: String,
    },
    Settled,
    Validated,
}

impl LoginState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Validated)
    }
}

/// Handshake settings copied out of [`Config`] for one negotiation.
#[derive(Debug, Clone)]
pub struct LoginSettings {
    pub login_url: String,
    pub public_key_url: String,
    pub error_page_marker: String,
    pub required_cookies: Vec<RequiredCookie>,
    pub max_redirects: usize,
    pub retry: RetryPolicy,
}

impl LoginSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            login_url: config.portal.login_url.clone(),
            public_key_url: config.portal.public_key_url.clone(),
            error_page_marker: config.portal.error_page_marker.clone(),
            required_cookies: config.portal.required_cookies.clone(),
            max_redirects: config.http.max_redirects,
            retry: RetryPolicy::from_config(&config.http),
        }
    }
}

/// A transport whose cookie jar passed validation.
pub struct AuthenticatedSession<T> {
    transport: T,
}

impl<T: PortalTransport> AuthenticatedSession<T> {
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn assume_validated(transport: T) -> Self {
        Self { transport }
    }
}

pub struct SessionNegotiator<T> {
    transport: T,
    settings: LoginSettings,
    credentials: Credentials,
    state: LoginState,
}

impl<T: PortalTransport> SessionNegotiator<T> {
    pub fn new(transport: T, settings: LoginSettings, credentials: Credentials) -> Self {
        Self {
            transport,
            settings,
            credentials,
            state: LoginState::Init,
        }
    }

    pub fn with_state(mut self, state: LoginState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    /// Runs every transition until the session is validated.
    pub async fn negotiate(mut self) -> Result<AuthenticatedSession<T>, SessionError> {
        while !self.state.is_terminal() {
            self.advance().await?;
        }
        info!(user = %self.credentials.username, "portal session established");
        Ok(AuthenticatedSession {
            transport: self.transport,
        })
    }

    /// Performs the transition out of the current state.
    pub async fn advance(&mut self) -> Result<&LoginState, SessionError> {
        let next = match &self.state {
            LoginState::Init => {
                let execution = self.fetch_execution_token().await?;
                let encrypted_password = self.encrypt_password().await?;
                LoginState::KeyFetched {
                    execution,
                    encrypted_password,
                }
            }
            LoginState::KeyFetched {
                execution,
                encrypted_password,
            } => self.submit(execution, encrypted_password).await?,
            LoginState::Submitted { location } => match location {
                Some(raw) => LoginState::Redirecting {
                    hop: 0,
                    next: resolve_redirect(&self.settings.login_url, raw)?,
                },
                None => LoginState::Settled,
            },
            LoginState::Redirecting { hop, next } => self.follow(*hop, next).await?,
            LoginState::Settled => {
                self.validate_cookies()?;
                LoginState::Validated
            }
            LoginState::Validated => LoginState::Validated,
        };
        self.state = next;
        Ok(&self.state)
    }

    async fn fetch_execution_token(&self) -> Result<String, SessionError> {
        let url = self.settings.login_url.as_str();
        let page = self
            .settings
            .retry
            .run("login page", || async {
                let response = self.transport.get(url, RequestKind::Page).await?;
                if !response.is_success() {
                    return Err(SessionError::LoginPageStatus(response.status));
                }
                Ok::<_, SessionError>(response.body)
            })
            .await?;
        hidden_input_value(&page, EXECUTION_FIELD).ok_or(SessionError::MissingExecutionToken)
    }

    async fn encrypt_password(&self) -> Result<String, SessionError> {
        let response = self
            .transport
            .get(&self.settings.public_key_url, RequestKind::Page)
            .await?;
        let key = PublicKey::from_json(&response.body)?;
        Ok(key.encrypt_hex(&self.credentials.password))
    }

    async fn submit(
        &self,
        execution: &str,
        encrypted_password: &str,
    ) -> Result<LoginState, SessionError> {
        let form = [
            ("username", self.credentials.username.as_str()),
            ("password", encrypted_password),
            (EXECUTION_FIELD, execution),
            ("_eventId", "submit"),
        ];
        let response = self
            .transport
            .post_form(&self.settings.login_url, &form)
            .await?;
        if !matches!(response.status, 200 | 301 | 302) {
            return Err(SessionError::UnexpectedStatus(response.status));
        }
        debug!(status = response.status, "login form accepted");
        Ok(LoginState::Submitted {
            location: response.location,
        })
    }

    async fn follow(&self, hop: usize, url: &str) -> Result<LoginState, SessionError> {
        if url.contains(&self.settings.error_page_marker) {
            return Err(SessionError::ErrorPage(url.to_string()));
        }
        if hop >= self.settings.max_redirects {
            return Err(SessionError::RedirectLimit(self.settings.max_redirects));
        }
        let response = self.transport.get(url, RequestKind::Page).await?;
        if response.status >= 400 {
            return Err(SessionError::RedirectStatus {
                hop,
                url: url.to_string(),
                status: response.status,
            });
        }
        debug!(hop, status = response.status, "followed login redirect");
        match response.location {
            Some(raw) => Ok(LoginState::Redirecting {
                hop: hop + 1,
                next: resolve_redirect(url, &raw)?,
            }),
            None => Ok(LoginState::Settled),
        }
    }

    fn validate_cookies(&self) -> Result<(), SessionError> {
        for cookie in &self.settings.required_cookies {
            if !self
                .transport
                .has_cookie(&cookie.name, cookie.path.as_deref())
            {
                return Err(SessionError::MissingCookie(cookie.name.clone()));
            }
        }
        Ok(())
    }
}

/// Resolves `location` against `base` and upgrades plain http to https.
pub fn resolve_redirect(base: &str, location: &str) -> Result<String, SessionError> {
    let location = location.trim();
    let resolved = match Url::parse(location) {
        Ok(url) => url,
        Err(_) => Url::parse(base)
            .and_then(|base| base.join(location))
            .map_err(|_| SessionError::InvalidRedirect(location.to_string()))?,
    };
    let text = resolved.to_string();
    Ok(match text.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => text,
    })
}
