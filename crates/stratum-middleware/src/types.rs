//! Request and response types seen by middleware.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type passed to middleware.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type returned by middleware.
pub type Response = http::Response<Full<Bytes>>;
