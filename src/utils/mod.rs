//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Last path segment of a link, used as the document's display name.
pub fn file_name_from_link(link: &str) -> &str {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}

/// Whether `href` names a file with the given extension (case-insensitive).
pub fn has_extension(href: &str, extension: &str) -> bool {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.to_lowercase().ends_with(&extension.to_lowercase())
}
