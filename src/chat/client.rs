//! HTTP client configuration for the inference server.

use crate::config::ChatSettings;
use crate::error::{Result, TubechatError};
use std::time::Duration;

/// Default connect timeout for the local inference server.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Create an HTTP client configured from chat settings.
///
/// No overall request timeout is set unless configured: a streamed reply
/// can legitimately take minutes.
pub fn create_client(settings: &ChatSettings) -> Result<reqwest::Client> {
    let connect_timeout = if settings.connect_timeout_secs == 0 {
        DEFAULT_CONNECT_TIMEOUT_SECS
    } else {
        settings.connect_timeout_secs
    };

    let mut builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout))
        .user_agent(concat!("tubechat/", env!("CARGO_PKG_VERSION")));

    if let Some(secs) = settings.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder
        .build()
        .map_err(|e| TubechatError::Internal(format!("Failed to create HTTP client: {}", e)))
}
