//! Configuration for the ticketbook application.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::media::MockImageGenerator;
use crate::views::DEFAULT_GRID_SIZE;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Image generation configuration
    pub image: ImageConfig,
    /// Minimum number of cells in the ticket grid
    pub grid_size: usize,
}

/// Image generation configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageConfig {
    /// Simulated generation delay
    pub delay: Duration,
    /// Placeholder-image endpoint
    pub base_url: String,
}

impl AppConfig {
    /// Loads configuration from the environment
    ///
    /// Recognized variables, all optional:
    /// - `TICKETBOOK_IMAGE_DELAY_MS`: simulated generation delay
    /// - `TICKETBOOK_IMAGE_BASE_URL`: placeholder-image endpoint
    /// - `TICKETBOOK_GRID_SIZE`: minimum grid cells
    ///
    /// Unparseable values fall back to the default with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        let delay_ms = parsed_env("TICKETBOOK_IMAGE_DELAY_MS", 3000u64);
        let base_url = env::var("TICKETBOOK_IMAGE_BASE_URL")
            .unwrap_or_else(|_| MockImageGenerator::DEFAULT_BASE_URL.to_string());
        let grid_size = parsed_env("TICKETBOOK_GRID_SIZE", DEFAULT_GRID_SIZE);

        Self {
            image: ImageConfig {
                delay: Duration::from_millis(delay_ms),
                base_url,
            },
            grid_size,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            image: ImageConfig {
                delay: MockImageGenerator::DEFAULT_DELAY,
                base_url: MockImageGenerator::DEFAULT_BASE_URL.to_string(),
            },
            grid_size: DEFAULT_GRID_SIZE,
        }
    }
}

/// Reads and parses an environment variable, warning on malformed values
fn parsed_env<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(%name, %raw, "unparseable value, using default");
            default
        }),
        Err(_) => default,
    }
}
