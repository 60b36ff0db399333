use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cookie_store::CookieStore;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, LOCATION, ORIGIN};
use reqwest::{redirect, Client, RequestBuilder};
use reqwest_cookie_store::CookieStoreMutex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{HttpConfig, PortalConfig};
use crate::portal::{PortalResponse, PortalTransport, RequestKind, TransportError};

const PAGE_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";
const DATA_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";
const BODY_PREVIEW_CHARS: usize = 180;

/// reqwest-backed transport with a private cookie jar and redirects disabled.
pub struct ReqwestTransport {
    client: Client,
    cookies: Arc<CookieStoreMutex>,
    data_origin: String,
}

impl ReqwestTransport {
    pub fn new(portal: &PortalConfig, http: &HttpConfig) -> Result<Self, TransportError> {
        let cookies = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        let client = Client::builder()
            .user_agent(portal.user_agent.as_str())
            .default_headers(headers)
            .redirect(redirect::Policy::none())
            .cookie_provider(Arc::clone(&cookies))
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .read_timeout(Duration::from_secs(http.read_timeout_secs))
            .build()
            .map_err(|err| TransportError::new("<client>", err.to_string()))?;
        Ok(Self {
            client,
            cookies,
            data_origin: portal.data_origin.clone(),
        })
    }

    fn decorate(&self, request: RequestBuilder, kind: RequestKind) -> RequestBuilder {
        match kind {
            RequestKind::Page => request.header(ACCEPT, PAGE_ACCEPT),
            RequestKind::Data => request
                .header(ACCEPT, DATA_ACCEPT)
                .header(ORIGIN, self.data_origin.as_str())
                .header("X-Requested-With", "XMLHttpRequest"),
        }
    }

    async fn execute(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> Result<PortalResponse, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|err| TransportError::new(url, err.to_string()))?;
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|err| TransportError::new(url, format!("failed reading body: {err}")))?;
        debug!(url, status, redirect = location.is_some(), "portal response");
        Ok(PortalResponse {
            status,
            location,
            body,
        })
    }
}

#[async_trait]
impl PortalTransport for ReqwestTransport {
    async fn get(&self, url: &str, kind: RequestKind) -> Result<PortalResponse, TransportError> {
        let request = self.decorate(self.client.get(url), kind);
        self.execute(url, request).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<PortalResponse, TransportError> {
        let request = self.decorate(self.client.post(url), RequestKind::Page).form(form);
        self.execute(url, request).await
    }

    /// Any domain matches; a given `path` must equal the cookie's stored path exactly.
    fn has_cookie(&self, name: &str, path: Option<&str>) -> bool {
        let Ok(store) = self.cookies.lock() else {
            return false;
        };
        let found = store.iter_any().any(|cookie| {
            cookie.name() == name && path.map_or(true, |p| &*cookie.path == p)
        });
        found
    }
}

#[cfg(test)]
impl ReqwestTransport {
    /// Seeds the jar as if `url` had answered with this `Set-Cookie` header.
    pub(crate) fn store_cookie(&self, set_cookie: &str, url: &str) {
        let url = reqwest::Url::parse(url).expect("url");
        self.cookies
            .lock()
            .expect("lock")
            .parse(set_cookie, &url)
            .expect("cookie accepted");
    }
}

pub fn body_preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

/// Case-insensitive key lookup; the portal is inconsistent about field casing.
pub fn object_get<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).or_else(|| {
        object
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Non-empty trimmed text from a string or number field.
pub fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object_get(object, key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn number_field(object: &Map<String, Value>, key: &str) -> Option<f64> {
    match object_get(object, key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}
