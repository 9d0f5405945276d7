//! Application-level configuration loading: save debounce, puzzle sizes, paging and the
//! layout generator endpoint.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CROSSWORD_BACK_CONFIG_PATH";
/// Environment variable that overrides the configured layout generator URL.
const LAYOUT_URL_ENV: &str = "LAYOUT_GENERATOR_URL";

const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 500;
const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const DEFAULT_PAGE_SIZE: usize = 25;
const DEFAULT_PUZZLE_SIZES: [u32; 5] = [10, 15, 20, 25, 30];

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    save_debounce: Duration,
    session_idle_timeout: Duration,
    puzzle_sizes: Vec<u32>,
    page_size: usize,
    layout_generator_url: Option<String>,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        debounce_ms = app_config.save_debounce.as_millis() as u64,
                        sizes = ?app_config.puzzle_sizes,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        match env::var(LAYOUT_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => config.with_layout_generator_url(url),
            _ => config,
        }
    }

    /// Delay between the last edit and the debounced progress save.
    pub fn save_debounce(&self) -> Duration {
        self.save_debounce
    }

    /// How long an open session may go without activity before it is flushed and evicted.
    pub fn session_idle_timeout(&self) -> Duration {
        self.session_idle_timeout
    }

    /// Grid sizes a user may request for a generated puzzle.
    pub fn puzzle_sizes(&self) -> &[u32] {
        &self.puzzle_sizes
    }

    /// Number of puzzles per catalogue page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// External layout service endpoint, if any.
    pub fn layout_generator_url(&self) -> Option<&str> {
        self.layout_generator_url.as_deref()
    }

    /// Override the save debounce delay.
    pub fn with_save_debounce(mut self, debounce: Duration) -> Self {
        self.save_debounce = debounce;
        self
    }

    /// Override the idle timeout; zero is raised to one second.
    pub fn with_session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.session_idle_timeout = timeout.max(Duration::from_secs(1));
        self
    }

    /// Override the catalogue page size (at least one).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Point generation at an external layout service.
    pub fn with_layout_generator_url(mut self, url: impl Into<String>) -> Self {
        self.layout_generator_url = Some(url.into());
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(DEFAULT_SAVE_DEBOUNCE_MS),
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
            puzzle_sizes: DEFAULT_PUZZLE_SIZES.to_vec(),
            page_size: DEFAULT_PAGE_SIZE,
            layout_generator_url: None,
        }
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    save_debounce_ms: Option<Duration>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    session_idle_timeout_ms: Option<Duration>,
    puzzle_sizes: Option<Vec<u32>>,
    page_size: Option<usize>,
    layout_generator_url: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let puzzle_sizes = value
            .puzzle_sizes
            .filter(|sizes| !sizes.is_empty() && sizes.iter().all(|size| *size > 0))
            .unwrap_or(defaults.puzzle_sizes);
        Self {
            save_debounce: value.save_debounce_ms.unwrap_or(defaults.save_debounce),
            session_idle_timeout: value
                .session_idle_timeout_ms
                .filter(|timeout| !timeout.is_zero())
                .unwrap_or(defaults.session_idle_timeout),
            puzzle_sizes,
            page_size: value
                .page_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults.page_size),
            layout_generator_url: value
                .layout_generator_url
                .filter(|url| !url.trim().is_empty()),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
