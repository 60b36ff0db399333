use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub grading: GradingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_public_key_url")]
    pub public_key_url: String,
    #[serde(default = "default_transcript_url")]
    pub transcript_url: String,
    #[serde(default = "default_major_stats_url")]
    pub major_stats_url: String,
    #[serde(default = "default_data_origin")]
    pub data_origin: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_error_page_marker")]
    pub error_page_marker: String,
    #[serde(default = "default_required_cookies")]
    pub required_cookies: Vec<RequiredCookie>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequiredCookie {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    #[serde(default = "default_non_major_weight")]
    pub non_major_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_true")]
    pub enable_desktop: bool,
    #[serde(default)]
    pub enable_stdout: bool,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_desktop_timeout_ms")]
    pub desktop_timeout_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_dir: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/grade-monitor/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(output_dir) = overrides.output_dir {
            self.storage.output_dir = output_dir;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_output_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.output_dir)
    }

    pub fn default_template() -> String {
        let template = r#"[portal]
login_url = "https://zjuam.zju.edu.cn/cas/login?service=https%3A%2F%2Fzdbk.zju.edu.cn%2Fjwglxt%2Fxtgl%2Flogin_ssologin.html"
public_key_url = "https://zjuam.zju.edu.cn/cas/v2/getPubKey"
transcript_url = "https://zdbk.zju.edu.cn/jwglxt/cxdy/xscjcx_cxXscjIndex.html?doType=query&queryModel.showCount=2000"
major_stats_url = "https://zdbk.zju.edu.cn/jwglxt/zycjtj/xszgkc_cxXsZgkcIndex.html?doType=query&queryModel.showCount=2000"
data_origin = "https://zdbk.zju.edu.cn"
error_page_marker = "filtererr.jsp"
required_cookies = [
    { name = "JSESSIONID", path = "/jwglxt" },
    { name = "route" },
]

[http]
connect_timeout_secs = 5
read_timeout_secs = 10
max_attempts = 3
retry_backoff_ms = 1000
max_redirects = 10

[grading]
non_major_weight = 0.3

[storage]
output_dir = "data"

[alerts]
enable_desktop = true
enable_stdout = false
webhook_url = ""
desktop_timeout_ms = 10000
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal: PortalConfig::default(),
            http: HttpConfig::default(),
            grading: GradingConfig::default(),
            storage: StorageConfig::default(),
            alerts: AlertsConfig::default(),
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            public_key_url: default_public_key_url(),
            transcript_url: default_transcript_url(),
            major_stats_url: default_major_stats_url(),
            data_origin: default_data_origin(),
            user_agent: default_user_agent(),
            error_page_marker: default_error_page_marker(),
            required_cookies: default_required_cookies(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            non_major_weight: default_non_major_weight(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enable_desktop: true,
            enable_stdout: false,
            webhook_url: String::new(),
            desktop_timeout_ms: default_desktop_timeout_ms(),
        }
    }
}

fn default_login_url() -> String {
    "https://zjuam.zju.edu.cn/cas/login?service=https%3A%2F%2Fzdbk.zju.edu.cn%2Fjwglxt%2Fxtgl%2Flogin_ssologin.html".to_string()
}

fn default_public_key_url() -> String {
    "https://zjuam.zju.edu.cn/cas/v2/getPubKey".to_string()
}

fn default_transcript_url() -> String {
    "https://zdbk.zju.edu.cn/jwglxt/cxdy/xscjcx_cxXscjIndex.html?doType=query&queryModel.showCount=2000".to_string()
}

fn default_major_stats_url() -> String {
    "https://zdbk.zju.edu.cn/jwglxt/zycjtj/xszgkc_cxXsZgkcIndex.html?doType=query&queryModel.showCount=2000".to_string()
}

fn default_data_origin() -> String {
    "https://zdbk.zju.edu.cn".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36 Edg/137.0.0.0".to_string()
}

fn default_error_page_marker() -> String {
    "filtererr.jsp".to_string()
}

fn default_required_cookies() -> Vec<RequiredCookie> {
    vec![
        RequiredCookie {
            name: "JSESSIONID".to_string(),
            path: Some("/jwglxt".to_string()),
        },
        RequiredCookie {
            name: "route".to_string(),
            path: None,
        },
    ]
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_read_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_max_redirects() -> usize {
    10
}

fn default_non_major_weight() -> f64 {
    0.3
}

fn default_output_dir() -> String {
    "data".to_string()
}

fn default_desktop_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}
