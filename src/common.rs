/// Common helpers shared across handlers and services
use axum::http::{header, HeaderMap, Uri};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub const DEFAULT_LOCALE: &str = "en-US";

const NANOID_LEN: usize = 21;

/// Short random id for file names and message references
pub fn nanoid() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NANOID_LEN)
        .map(char::from)
        .collect()
}

fn is_language_tag(tag: &str) -> bool {
    let mut parts = tag.split('-');
    let primary_ok = parts
        .next()
        .map(|p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false);
    primary_ok
        && parts.all(|p| (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Highest weighted well-formed tag from an `Accept-Language` value
pub fn preferred_locale(accept_language: Option<&str>) -> String {
    let Some(raw) = accept_language else {
        return DEFAULT_LOCALE.to_string();
    };

    let mut candidates: Vec<(f32, usize, &str)> = raw
        .split(',')
        .enumerate()
        .filter_map(|(position, entry)| {
            let mut pieces = entry.trim().split(';');
            let tag = pieces.next()?.trim();
            if !is_language_tag(tag) {
                return None;
            }
            let weight = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .map(|q| q.parse::<f32>().unwrap_or(0.0))
                .unwrap_or(1.0);
            (weight > 0.0).then_some((weight, position, tag))
        })
        .collect();

    candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    candidates
        .first()
        .map(|(_, _, tag)| tag.to_string())
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

pub fn request_locale(headers: &HeaderMap) -> String {
    preferred_locale(
        headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok()),
    )
}

fn is_site_relative(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.chars().any(|c| c.is_control())
}

/// The page the request came from, as a site-relative path. Referrers from
/// another host are dropped so they never end up in a redirect.
pub fn request_referrer(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())?;

    if raw.starts_with('/') {
        return is_site_relative(raw).then(|| raw.to_string());
    }

    let uri: Uri = raw.parse().ok()?;
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok())?;
    let same_origin = uri
        .authority()
        .is_some_and(|authority| authority.as_str().eq_ignore_ascii_case(host));
    if !same_origin {
        return None;
    }
    uri.path_and_query()
        .map(|pq| pq.as_str())
        .filter(|path| is_site_relative(path))
        .map(str::to_string)
}

/// First hop of `x-forwarded-for`, or "unknown"
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

pub fn client_location(headers: &HeaderMap) -> String {
    headers
        .get("x-client-location")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}
