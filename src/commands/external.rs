//! External Link Commands
//!
//! Opens links from the report in the user's browser. Only `https` links are
//! passed on to the OS.

use url::Url;

use crate::models::response::CommandResponse;
use crate::utils::error::{AppError, AppResult};

/// Accept only absolute `https` links with a host and no embedded credentials
pub fn check_external_url(url: &str) -> AppResult<Url> {
    let trimmed = url.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|e| AppError::validation(format!("Invalid link '{}': {}", trimmed, e)))?;

    if parsed.scheme() != "https" {
        return Err(AppError::validation(format!(
            "Only https links can be opened, got '{}'",
            parsed.scheme()
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AppError::validation("Link has no host"));
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(AppError::validation("Links with credentials are not opened"));
    }
    Ok(parsed)
}

/// Check `url` and hand it to `open`, the platform opener
pub fn open_external<F>(url: &str, open: F) -> CommandResponse<()>
where
    F: FnOnce(&str) -> AppResult<()>,
{
    check_external_url(url)
        .and_then(|link| {
            tracing::debug!("Opening external link on {}", link.host_str().unwrap_or(""));
            open(link.as_str())
        })
        .into()
}
