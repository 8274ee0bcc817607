//! Well-known property keys
//!
//! Checks and validators agree on these identifiers by convention. The core
//! never interprets the values behind them.

use crate::property::PropertyKey;

/// Addresses resolved for the target host (`Vec<String>`)
pub const DNS_ADDRESSES: PropertyKey = PropertyKey::from_static("dns.addresses");
/// Echo round trip (`Duration`)
pub const PING_ROUND_TRIP: PropertyKey = PropertyKey::from_static("ping.round_trip");
/// HTTP response status (`i64`)
pub const HTTP_STATUS: PropertyKey = PropertyKey::from_static("http.status");
/// HTTP response headers (`BTreeMap<String, String>`)
pub const HTTP_HEADERS: PropertyKey = PropertyKey::from_static("http.headers");
/// Raw HTTP response body (`Vec<u8>`)
pub const HTTP_BODY: PropertyKey = PropertyKey::from_static("http.body");
/// Time to last byte (`Duration`)
pub const HTTP_ELAPSED: PropertyKey = PropertyKey::from_static("http.elapsed");
/// Rendered page content from a browser fetch (`String`)
pub const BROWSER_CONTENT: PropertyKey = PropertyKey::from_static("browser.content");

// Report metadata
pub const REPORT_TITLE: PropertyKey = PropertyKey::from_static("report.title");
pub const REPORT_BASELINE: PropertyKey = PropertyKey::from_static("report.baseline");
pub const REPORT_CANDIDATE: PropertyKey = PropertyKey::from_static("report.candidate");
