use indexmap::IndexMap;

/// Parse free-text custom headers: one per line, `Name: value` or
/// `Name=value` (split at the first separator, `:` preferred). Blank lines,
/// lines without a separator and lines with an empty name are ignored; order
/// is preserved.
pub fn parse_custom_headers(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':').or_else(|| line.split_once('=')))
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// A bearer token counts only when it is non-empty after trimming.
pub fn effective_token(token: Option<&str>) -> Option<&str> {
    token.map(str::trim).filter(|t| !t.is_empty())
}

/// Headers sent when fetching a spec: `Authorization` from the token first,
/// then the custom headers. A custom `Authorization` is dropped when a token is
/// set. Repeated names keep their first position and take the last value.
pub fn spec_fetch_headers(
    token: Option<&str>,
    custom: &[(String, String)],
) -> IndexMap<String, String> {
    let token = effective_token(token);
    let mut headers = IndexMap::new();
    if let Some(token) = token {
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
    }
    for (name, value) in custom {
        if token.is_some() && name.eq_ignore_ascii_case("authorization") {
            continue;
        }
        headers.insert(name.clone(), value.clone());
    }
    headers
}

/// Generic headers of a prepared request, in emission order: Content-Type,
/// bearer token, custom headers, then a default Accept when none was given.
pub fn request_headers(
    content_type: Option<&str>,
    token: Option<&str>,
    custom: &[(String, String)],
) -> Vec<(String, String)> {
    let token = effective_token(token);
    let mut headers = Vec::new();
    if let Some(ct) = content_type {
        headers.push(("Content-Type".to_string(), ct.to_string()));
    }
    if let Some(token) = token {
        headers.push(("Authorization".to_string(), format!("Bearer {token}")));
    }
    for (name, value) in custom {
        if name.eq_ignore_ascii_case("host") {
            continue;
        }
        if token.is_some() && name.eq_ignore_ascii_case("authorization") {
            continue;
        }
        headers.push((name.clone(), value.clone()));
    }
    if !headers.iter().any(|(n, _)| n.eq_ignore_ascii_case("accept")) {
        headers.push(("Accept".to_string(), "application/json".to_string()));
    }
    headers
}
