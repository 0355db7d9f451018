//! Locating the caller's cluster credential.

/// Extracts the token from an `Authorization` header value.
///
/// A `Bearer` scheme (any case) is stripped; other values are used as-is.
#[must_use]
pub fn from_authorization_header(value: &str) -> Option<String> {
    let value = value.trim();
    let token = match value.get(..6) {
        Some(scheme)
            if scheme.eq_ignore_ascii_case("bearer")
                && value[6..].chars().next().is_none_or(char::is_whitespace) =>
        {
            value[6..].trim()
        }
        _ => value,
    };

    (!token.is_empty()).then(|| token.to_string())
}

/// Picks the credential for a request.
///
/// The `k8s_token` form value takes precedence over the header.
#[must_use]
pub fn resolve(form_value: Option<&str>, authorization: Option<&str>) -> Option<String> {
    form_value
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .or_else(|| authorization.and_then(from_authorization_header))
}
