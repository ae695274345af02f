use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::workflows::listings::ListingSelectors;
use crate::workflows::syndication::FeedMetadata;

pub const DEFAULT_SOURCE_URL: &str = "https://jobs.greenclimate.fund/en/sites/CX_1001/jobs";
const DEFAULT_SELF_LINK: &str = "https://cinfoposte.github.io/gcf-jobs/gcf_jobs.xml";

/// Distinguishes runtime behavior for different stages of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for a harvest run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub source: SourceConfig,
    pub feed: FeedConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let url = parse_url("JOBS_SOURCE_URL", DEFAULT_SOURCE_URL)?;
        let base_url = match env::var("JOBS_BASE_URL") {
            Ok(value) if !value.trim().is_empty() => {
                Some(Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
                    variable: "JOBS_BASE_URL",
                    source,
                })?)
            }
            _ => None,
        };
        let render_timeout = Duration::from_secs(parse_number("JOBS_RENDER_TIMEOUT_SECS", 30)?);
        let settle_delay = Duration::from_millis(parse_number("JOBS_SETTLE_MILLIS", 2000)?);
        let tab_label = env::var("JOBS_TAB_LABEL")
            .unwrap_or_else(|_| "Staffs".to_string())
            .trim()
            .to_string();
        let max_listings = parse_number("JOBS_MAX_LISTINGS", 50)? as usize;
        let detail_lookup = parse_flag("JOBS_DETAIL_LOOKUP", true)?;
        let chrome_executable = env::var("JOBS_CHROME_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let output_path = PathBuf::from(
            env::var("FEED_OUTPUT_PATH").unwrap_or_else(|_| "gcf_jobs.xml".to_string()),
        );
        let title = env::var("FEED_TITLE").unwrap_or_else(|_| "Green Climate Fund Jobs".to_string());
        let description = env::var("FEED_DESCRIPTION")
            .unwrap_or_else(|_| "Job listings from Green Climate Fund".to_string());
        let link = parse_url("FEED_LINK", url.as_str())?;
        let language = env::var("FEED_LANGUAGE").unwrap_or_else(|_| "en-us".to_string());
        let self_link = match env::var("FEED_SELF_LINK") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(Url::parse(value.trim()).map_err(|source| {
                ConfigError::InvalidUrl {
                    variable: "FEED_SELF_LINK",
                    source,
                }
            })?),
            Err(_) => Some(Url::parse(DEFAULT_SELF_LINK).map_err(|source| {
                ConfigError::InvalidUrl {
                    variable: "FEED_SELF_LINK",
                    source,
                }
            })?),
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let mut telemetry = TelemetryConfig::for_environment(environment, log_level);
        telemetry.ansi = parse_flag("APP_LOG_ANSI", telemetry.ansi)?;

        Ok(Self {
            environment,
            source: SourceConfig {
                url,
                base_url,
                render_timeout,
                settle_delay,
                tab_label: (!tab_label.is_empty()).then_some(tab_label),
                max_listings,
                detail_lookup,
                chrome_executable,
                selectors: ListingSelectors::default(),
            },
            feed: FeedConfig {
                output_path,
                metadata: FeedMetadata {
                    title,
                    link,
                    description,
                    language,
                    self_link,
                },
            },
            telemetry,
        })
    }
}

/// Where listings come from and how the page is rendered.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub url: Url,
    /// Base for relative job links. Unset means the rendered page's own address.
    pub base_url: Option<Url>,
    pub render_timeout: Duration,
    pub settle_delay: Duration,
    pub tab_label: Option<String>,
    pub max_listings: usize,
    pub detail_lookup: bool,
    pub chrome_executable: Option<PathBuf>,
    pub selectors: ListingSelectors,
}

/// Channel metadata and the path the feed is published to.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub output_path: PathBuf,
    pub metadata: FeedMetadata,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Colored output, on by default only in development.
    pub ansi: bool,
    pub show_targets: bool,
}

impl TelemetryConfig {
    pub fn for_environment(environment: AppEnvironment, log_level: impl Into<String>) -> Self {
        let local = environment == AppEnvironment::Development;
        Self {
            log_level: log_level.into(),
            ansi: local,
            show_targets: local,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidUrl {
        variable: &'static str,
        source: url::ParseError,
    },
    InvalidNumber {
        variable: &'static str,
        value: String,
    },
    InvalidFlag {
        variable: &'static str,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUrl { variable, .. } => {
                write!(f, "{variable} must be an absolute URL")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a non-negative integer (got '{value}')")
            }
            ConfigError::InvalidFlag { variable, value } => {
                write!(f, "{variable} must be true or false (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidUrl { source, .. } => Some(source),
            ConfigError::InvalidNumber { .. } | ConfigError::InvalidFlag { .. } => None,
        }
    }
}

fn parse_url(variable: &'static str, default: &str) -> Result<Url, ConfigError> {
    let raw = env::var(variable).unwrap_or_else(|_| default.to_string());
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { variable, source })
}

fn parse_number(variable: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(variable) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { variable, value }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(variable: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(variable) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { variable, value }),
        },
        Err(_) => Ok(default),
    }
}
