//! Utility functions for URL inspection and archive entry naming

/// Entry name used when a URL has no usable final path segment
const FALLBACK_ENTRY_NAME: &str = "file";

/// Derive the archive entry name for a URL
///
/// The entry is named after the URL's final path segment. Query strings and
/// fragments are ignored. Unparseable URLs fall back to splitting the raw
/// string on `/`.
///
/// # Examples
///
/// ```
/// use archive_dl::utils::entry_name_from_url;
///
/// assert_eq!(entry_name_from_url("https://example.com/docs/report.pdf"), "report.pdf");
/// assert_eq!(entry_name_from_url("https://example.com/img/cat.jpeg?size=large"), "cat.jpeg");
/// ```
pub fn entry_name_from_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url)
        && let Some(segment) = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
    {
        return segment.to_string();
    }

    let without_suffix = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url);

    without_suffix
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(FALLBACK_ENTRY_NAME)
        .to_string()
}

/// Check whether a URL ends in one of the allowed extensions
///
/// The check is a case-sensitive suffix match on the raw URL string against
/// `.<ext>` for every extension in `allowed`.
///
/// # Examples
///
/// ```
/// use archive_dl::utils::has_allowed_extension;
///
/// let allowed = vec!["jpeg".to_string(), "pdf".to_string()];
/// assert!(has_allowed_extension("http://example.com/a.pdf", &allowed));
/// assert!(!has_allowed_extension("http://example.com/a.PDF", &allowed));
/// assert!(!has_allowed_extension("http://example.com/a.png", &allowed));
/// ```
pub fn has_allowed_extension(url: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|ext| {
        url.strip_suffix(ext.as_str())
            .is_some_and(|rest| rest.ends_with('.'))
    })
}
