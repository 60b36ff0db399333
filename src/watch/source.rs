use async_trait::async_trait;
use tracing::debug;

use crate::auth::{AuthenticatedSession, Credentials, LoginSettings, SessionNegotiator};
use crate::config::Config;
use crate::portal::http::ReqwestTransport;
use crate::portal::{PortalTransport, TransportError};
use crate::records::fetcher::RecordFetcher;
use crate::records::reconcile::reconcile;
use crate::records::CourseRecord;
use crate::watch::{CycleError, RecordSource};

/// Hands out a transport with an empty cookie jar for every login.
pub trait Connector: Send + Sync {
    type Transport: PortalTransport;

    fn connect(&self) -> Result<Self::Transport, TransportError>;
}

pub struct ReqwestConnector {
    config: Config,
}

impl ReqwestConnector {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Connector for ReqwestConnector {
    type Transport = ReqwestTransport;

    fn connect(&self) -> Result<ReqwestTransport, TransportError> {
        ReqwestTransport::new(&self.config.portal, &self.config.http)
    }
}

pub struct PortalSource<C> {
    connector: C,
    config: Config,
    credentials: Credentials,
}

impl<C: Connector> PortalSource<C> {
    pub fn new(connector: C, config: &Config, credentials: Credentials) -> Self {
        Self {
            connector,
            config: config.clone(),
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub async fn login(&self) -> Result<AuthenticatedSession<C::Transport>, CycleError> {
        let transport = self.connector.connect()?;
        let negotiator = SessionNegotiator::new(
            transport,
            LoginSettings::from_config(&self.config),
            self.credentials.clone(),
        );
        Ok(negotiator.negotiate().await?)
    }
}

#[async_trait]
impl<C: Connector> RecordSource for PortalSource<C> {
    async fn fetch_records(&self) -> Result<Vec<CourseRecord>, CycleError> {
        let session = self.login().await?;
        let fetcher = RecordFetcher::new(&session, &self.config);
        let major = fetcher.fetch_major_stats().await?;
        let transcript = fetcher.fetch_transcript().await?;
        let records = reconcile(&major, &transcript);
        debug!(
            major = major.len(),
            transcript = transcript.len(),
            records = records.len(),
            "reconciled portal records"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::json;

    use super::{Connector, PortalSource};
    use crate::auth::{Credentials, SessionError};
    use crate::config::Config;
    use crate::portal::{PortalResponse, TransportError};
    use crate::records::fetcher::tests::{test_config, UrlScriptedTransport};
    use crate::records::semester::Semester;
    use crate::watch::{CycleError, RecordSource};

    const LOGIN_PAGE: &str = r#"<input type="hidden" name="execution" value="e1s1">"#;
    const KEY_JSON: &str = r#"{"modulus":"ca1","exponent":"11"}"#;
    const LANDING: &str = "https://portal.example.edu/jwglxt/xtgl/index.html";

    /// One scripted transport per login, in order.
    struct QueueConnector(Mutex<VecDeque<UrlScriptedTransport>>);

    impl Connector for QueueConnector {
        type Transport = UrlScriptedTransport;

        fn connect(&self) -> Result<UrlScriptedTransport, TransportError> {
            self.0
                .lock()
                .expect("lock")
                .pop_front()
                .ok_or_else(|| TransportError::new("<connector>", "no transport left"))
        }
    }

    fn config() -> Config {
        let mut config = test_config();
        config.portal.login_url = "https://cas.example.edu/cas/login".to_string();
        config.portal.public_key_url = "https://cas.example.edu/cas/v2/getPubKey".to_string();
        config
    }

    fn logged_in(config: &Config) -> UrlScriptedTransport {
        UrlScriptedTransport::new()
            .push(&config.portal.login_url, Ok(PortalResponse::ok(LOGIN_PAGE)))
            .push(&config.portal.public_key_url, Ok(PortalResponse::ok(KEY_JSON)))
            .push(
                &config.portal.login_url,
                Ok(PortalResponse::redirect(302, LANDING)),
            )
            .push(LANDING, Ok(PortalResponse::ok("<html>welcome</html>")))
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "3200100000".to_string(),
            password: "secret".to_string(),
        }
    }

    fn source(config: &Config, transports: Vec<UrlScriptedTransport>) -> PortalSource<QueueConnector> {
        PortalSource::new(
            QueueConnector(Mutex::new(transports.into())),
            config,
            credentials(),
        )
    }

    #[tokio::test]
    async fn cycle_logs_in_fetches_both_sources_and_reconciles() {
        let config = config();
        let major = json!({ "items": [
            { "kcmc": "数据结构", "xf": "3", "cj": "92", "xkkh": "(2023-2024-1)-A-1", "xdbjmc": "已修" },
            { "kcmc": "编译原理", "xf": "4", "cj": "", "xkkh": "(2024-2025-1)-B-1", "xdbjmc": "未修" }
        ]});
        let transcript = json!({ "items": [
            { "kcmc": "数据结构", "xf": "3", "cj": "92", "xkkh": "(2023-2024-1)-A-1" },
            { "kcmc": "体育", "xf": "1", "cj": "良好", "xkkh": "(2023-2024-1)-C-1" }
        ]});
        let transport = logged_in(&config)
            .push(&config.portal.major_stats_url, Ok(PortalResponse::ok(major.to_string())))
            .push(
                &config.portal.transcript_url,
                Ok(PortalResponse::ok(transcript.to_string())),
            );

        let records = source(&config, vec![transport])
            .fetch_records()
            .await
            .expect("cycle succeeds");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "数据结构");
        assert!(records[0].is_major);
        assert_eq!(records[1].name, "体育");
        assert!(!records[1].is_major);
        assert_eq!(records[1].semester, Semester::from_label("23-24秋冬"));
    }

    #[tokio::test]
    async fn every_cycle_uses_a_new_transport() {
        let config = config();
        let empty = r#"{"items":[]}"#;
        let build = || {
            logged_in(&config)
                .push(&config.portal.major_stats_url, Ok(PortalResponse::ok(empty)))
                .push(&config.portal.transcript_url, Ok(PortalResponse::ok(empty)))
        };
        let source = source(&config, vec![build(), build()]);
        assert!(source.fetch_records().await.expect("first").is_empty());
        assert!(source.fetch_records().await.expect("second").is_empty());
        assert!(matches!(
            source.fetch_records().await,
            Err(CycleError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn missing_cookie_fails_the_cycle_before_fetching() {
        let config = config();
        let transport = logged_in(&config).without_cookie("route");
        let err = source(&config, vec![transport])
            .fetch_records()
            .await
            .expect_err("login rejected");
        assert_eq!(
            err,
            CycleError::Session(SessionError::MissingCookie("route".to_string()))
        );
    }
}
