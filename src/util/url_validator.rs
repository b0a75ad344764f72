use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL points to a private/internal IP address.
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    /// The URL points to localhost.
    #[error("Localhost not allowed")]
    Localhost,
}

/// Validate a model-supplied URL before the app fetches it in the background.
///
/// Story URLs come from generated text, so they are treated as untrusted:
/// only `http`/`https` is accepted, and hosts that resolve to this machine
/// or a private network are refused.
///
/// ```
/// use newsdigest::util::validate_url;
///
/// assert!(validate_url("https://www.dailymirror.lk/story/1").is_ok());
/// assert!(validate_url("http://192.168.1.1/").is_err());
/// assert!(validate_url("javascript:alert(1)").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = validate_url_for_open(url_str)?;

    if let Some(host) = url.host_str() {
        if host.eq_ignore_ascii_case("localhost") {
            return Err(UrlValidationError::Localhost);
        }

        let bare = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if let Ok(ip) = bare.parse::<IpAddr>() {
            if ip.is_loopback() {
                return Err(UrlValidationError::Localhost);
            }
            if is_private_ip(&ip) {
                return Err(UrlValidationError::PrivateIp(ip.to_string()));
            }
        }
    }

    Ok(url)
}

/// Scheme check only, for URLs handed to the system browser.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_link_local() || v4.is_unspecified(),
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            // fc00::/7 unique local, fe80::/10 link local
            v6.is_unspecified() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    }
}

/// Short publisher label for a story URL: the host without a leading `www.`.
///
/// Falls back to the text between `scheme://` and the first `/`, `?` or `#`
/// when the URL does not parse; returns an empty string if even that fails.
pub fn source_label(url_str: &str) -> String {
    if url_str.is_empty() {
        return String::new();
    }
    let host = match Url::parse(url_str) {
        Ok(url) => url.host_str().unwrap_or_default().to_string(),
        Err(e) => {
            tracing::warn!(url = %url_str, error = %e, "Could not parse URL for source label");
            fallback_host(url_str).unwrap_or_default().to_string()
        }
    };
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

fn fallback_host(url_str: &str) -> Option<&str> {
    let (scheme, rest) = url_str.split_once("://")?;
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return None;
    }
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end]).filter(|h| !h.is_empty())
}
