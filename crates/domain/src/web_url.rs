use url::Url;
use wereport_core::{AppError, AppResult};

/// Parses an absolute `http` or `https` URL with a non-empty host.
///
/// `field` names the input in the validation message.
pub fn parse_http_url(field: &str, value: &str) -> AppResult<Url> {
    let invalid = || {
        AppError::Validation(format!(
            "{field} '{value}' must be an absolute http or https URL"
        ))
    };

    let url = Url::parse(value.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(invalid()),
    }
}
