//! Request headers sent with every GoBiz call.
//!
//! GoBiz only accepts calls that look like they come from the merchant web
//! dashboard, so every request carries the same browser identity plus the
//! session's device id.

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

use super::error::{ApiError, Result};

const PORTAL_ORIGIN: &str = "https://portal.gofoodmerchant.co.id";
const PORTAL_REFERER: &str = "https://portal.gofoodmerchant.co.id/";
const APP_VERSION: &str = "platform-v3.97.0-b986b897";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Header carrying the session's device id.
pub const DEVICE_ID_HEADER: &str = "x-uniqueid";

/// Fixed client-identity and locale headers, in the order the dashboard sends them.
/// Accept-Encoding is left to reqwest so responses are always decodable.
const FIXED_HEADERS: &[(&str, &str)] = &[
    ("content-type", "application/json"),
    ("accept", "application/json, text/plain, */*"),
    ("accept-language", "id"),
    ("origin", PORTAL_ORIGIN),
    ("referer", PORTAL_REFERER),
    ("authentication-type", "go-id"),
    ("gojek-country-code", "ID"),
    ("gojek-timezone", "Asia/Jakarta"),
    ("x-appid", "go-biz-web-dashboard"),
    ("x-appversion", APP_VERSION),
    ("x-deviceos", "Web"),
    ("x-phonemake", "Windows 10 64-bit"),
    ("x-phonemodel", "Chrome 143.0.0.0 on Windows 10 64-bit"),
    ("x-platform", "Web"),
    ("x-user-locale", "en-US"),
    ("x-user-type", "merchant"),
    ("user-agent", USER_AGENT),
    ("sec-ch-ua", "\"Google Chrome\";v=\"143\", \"Chromium\";v=\"143\""),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "cross-site"),
];

/// Build the header set for a call made under a session.
///
/// With `access_token` set, an `Authorization: Bearer` header is added.
/// The only failure is a device id or token that is not a valid header value.
pub fn build_headers(device_unique_id: &str, access_token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(FIXED_HEADERS.len() + 2);
    for &(name, value) in FIXED_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    headers.insert(
        HeaderName::from_static(DEVICE_ID_HEADER),
        HeaderValue::from_str(device_unique_id).map_err(|_| ApiError::InvalidCredential)?,
    );

    if let Some(token) = access_token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidCredential)?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }

    Ok(headers)
}
