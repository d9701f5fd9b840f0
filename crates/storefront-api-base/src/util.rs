//! Utility functions for API operations.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything but the unreserved characters of RFC 3986.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encodes a string for use as a single path segment.
pub fn encode_path_segment<T: AsRef<str>>(s: T) -> String {
    utf8_percent_encode(s.as_ref(), PATH_SEGMENT).to_string()
}

/// Marker used for endpoints that require authentication.
/// It will be included in the request's extensions to signal to the middleware
/// that authentication is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequired {
    /// Bearer token authentication using the session's access token.
    Bearer,
}
