use axum::http::{header, header::InvalidHeaderValue, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};

/// Name of the cookie carrying the session credential
pub const SESSION_COOKIE: &str = "bmusession";

/// Value of the named cookie, if the request carries one
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// `Set-Cookie` value that stores the credential until it expires
pub fn session_cookie(token: &str, expires: DateTime<Utc>, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}={}; Expires={}; HttpOnly; Path=/",
        SESSION_COOKIE,
        token,
        http_date(expires)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// `Set-Cookie` value that makes the browser drop the session
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("bmusession=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Path=/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; bmusession=abc.def.ghi; lang=en"));
        assert_eq!(parse_cookie(&headers, SESSION_COOKIE).as_deref(), Some("abc.def.ghi"));
        assert_eq!(parse_cookie(&headers, "missing"), None);
    }

    #[test]
    fn no_cookie_header() {
        assert_eq!(parse_cookie(&HeaderMap::new(), SESSION_COOKIE), None);
    }

    #[test]
    fn session_cookie_attributes() {
        let expires = Utc.with_ymd_and_hms(2030, 1, 6, 12, 0, 0).unwrap();
        let value = session_cookie("tok", expires, true).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "bmusession=tok; Expires=Sun, 06 Jan 2030 12:00:00 GMT; HttpOnly; Path=/; Secure"
        );
    }
}
