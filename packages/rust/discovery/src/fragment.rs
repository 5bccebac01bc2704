//! Hand-off session lookup in fragment-style page URLs.
//!
//! Upstream tools link to the widget with the session in the fragment, e.g.
//! `https://example.com/#/chat?session=abc123`. The main query string is not
//! consulted.

use url::Url;

/// Name of the fragment query parameter carrying the hand-off session.
const SESSION_PARAM: &str = "session";

/// Extract the `session` parameter from the query part of the URL fragment.
///
/// Returns `None` when there is no fragment, no `?` inside it, no `session`
/// parameter, or the parameter is empty.
pub fn session_from_fragment(url: &Url) -> Option<String> {
    let fragment = url.fragment()?;
    let (_, query) = fragment.split_once('?')?;

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == SESSION_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
