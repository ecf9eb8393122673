//! Target-origin resolution for outbound messages.

use url::Url;

/// Target origin that matches any recipient.
pub const ANY_ORIGIN: &str = "*";

/// Resolve the origin messages to a frame should be scoped to.
///
/// Absolute `http`/`https` sources yield `scheme://host[:port]`. Relative and
/// protocol-relative sources are resolved against `page`, the URL of the
/// embedding document, when it is known. Anything else yields `"*"`.
pub fn resolve_origin(src: &str, page: Option<&Url>) -> String {
    let src = src.trim();
    if src.is_empty() {
        return ANY_ORIGIN.to_string();
    }

    let resolved = match Url::parse(src) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => page.and_then(|base| base.join(src).ok()),
        Err(_) => None,
    };

    match resolved {
        Some(url) if matches!(url.scheme(), "http" | "https") => {
            let origin = url.origin();
            if origin.is_tuple() {
                origin.ascii_serialization()
            } else {
                ANY_ORIGIN.to_string()
            }
        }
        _ => ANY_ORIGIN.to_string(),
    }
}

/// Returns true if a message posted with `target_origin` may be delivered to
/// a window whose origin is `recipient_origin`.
pub fn origin_matches(target_origin: &str, recipient_origin: &str) -> bool {
    target_origin == ANY_ORIGIN || target_origin == recipient_origin
}
