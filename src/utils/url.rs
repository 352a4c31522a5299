// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// Falls back to the raw `href` when it cannot be joined.
///
/// # Examples
/// ```
/// use mvc_watch::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://telegov.njportal.com", "/njmvc/AppointmentWizard/12/132"),
///     "https://telegov.njportal.com/njmvc/AppointmentWizard/12/132"
/// );
/// ```
pub fn resolve(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Last two non-empty path segments of an absolute URL, in order.
///
/// Query and fragment are ignored. Returns `None` when the URL cannot be
/// parsed or its path is shorter than two segments.
///
/// # Examples
/// ```
/// use mvc_watch::utils::url::last_two_segments;
///
/// assert_eq!(
///     last_two_segments("https://telegov.njportal.com/njmvc/AppointmentWizard/12/132/2024-05-17/830"),
///     Some(("2024-05-17".to_string(), "830".to_string()))
/// );
/// ```
pub fn last_two_segments(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., first, second] => Some((first.to_string(), second.to_string())),
        _ => None,
    }
}
