use chrono::Utc;
use wereport_core::{AppError, AppResult, Principal};
use wereport_domain::Profile;
use wereport_infrastructure::{InMemoryPrincipalRepository, InMemoryProfileRepository};

/// Parses `token=subject[:admin]` entries separated by commas.
pub fn parse_access_tokens(value: &str) -> AppResult<Vec<(String, Principal)>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (token, owner) = entry.split_once('=').ok_or_else(|| {
                AppError::Validation(format!(
                    "DEV_ACCESS_TOKENS entry '{entry}' must look like token=subject[:admin]"
                ))
            })?;

            let (subject, is_admin) = match owner.trim().split_once(':') {
                Some((subject, "admin")) => (subject, true),
                Some((_, role)) => {
                    return Err(AppError::Validation(format!(
                        "DEV_ACCESS_TOKENS role '{role}' is not supported"
                    )));
                }
                None => (owner.trim(), false),
            };

            let token = token.trim();
            let subject = subject.trim();
            if token.is_empty() || subject.is_empty() {
                return Err(AppError::Validation(format!(
                    "DEV_ACCESS_TOKENS entry '{entry}' has an empty token or subject"
                )));
            }

            Ok((token.to_owned(), Principal::new(subject, None, is_admin)))
        })
        .collect()
}

/// Registers each token and gives its subject a blank profile.
pub async fn register_access_tokens(
    principals: &InMemoryPrincipalRepository,
    profiles: &InMemoryProfileRepository,
    value: &str,
) -> AppResult<usize> {
    let entries = parse_access_tokens(value)?;
    let count = entries.len();

    for (token, principal) in entries {
        profiles
            .register(Profile::blank(
                principal.subject(),
                principal.email().map(str::to_owned),
                principal.is_admin(),
                Utc::now(),
            ))
            .await;
        principals.register(token, principal).await;
    }

    Ok(count)
}
