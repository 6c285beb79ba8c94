//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time
//! - Device detection
//! - The injected wallet provider

pub mod wallet;

pub use wallet::{
    InstallHint, NoWallet, StubWallet, WalletAddress, WalletError, WalletProvider, install_hint,
};

#[cfg(target_arch = "wasm32")]
pub use wallet::InjectedWallet;

/// Unix time in milliseconds
#[cfg(target_arch = "wasm32")]
pub fn unix_time_ms() -> f64 {
    js_sys::Date::now()
}

/// Unix time in milliseconds
#[cfg(not(target_arch = "wasm32"))]
pub fn unix_time_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Browser user agent, empty when unavailable
#[cfg(target_arch = "wasm32")]
pub fn user_agent() -> String {
    web_sys::window()
        .and_then(|w| w.navigator().user_agent().ok())
        .unwrap_or_default()
}

/// Current page URL, empty when unavailable
#[cfg(target_arch = "wasm32")]
pub fn page_url() -> String {
    web_sys::window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default()
}

/// Phones and tablets, where wallets live in an in-app browser
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    const MARKERS: [&str; 6] = ["android", "iphone", "ipad", "ipod", "mobile", "opera mini"];
    let ua = user_agent.to_lowercase();
    MARKERS.iter().any(|m| ua.contains(m))
}

/// `scheme://host[:port]` part of a URL, or the whole input if it has no scheme
pub fn url_origin(url: &str) -> &str {
    let Some(scheme_end) = url.find("://") else {
        return url;
    };
    let rest = &url[scheme_end + 3..];
    match rest.find(['/', '?', '#']) {
        Some(path_start) => &url[..scheme_end + 3 + path_start],
        None => url,
    }
}

/// Percent-encode a URI component with the browser's own `encodeURIComponent`
#[cfg(target_arch = "wasm32")]
pub fn encode_uri_component(input: &str) -> String {
    js_sys::encode_uri_component(input).into()
}

/// Native twin of `encodeURIComponent` so hints can be built and tested off the browser
#[cfg(not(target_arch = "wasm32"))]
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_detection() {
        assert!(is_mobile_user_agent(
            "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Mobile Safari/537.36"
        ));
        assert!(is_mobile_user_agent("Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X)"));
        assert!(!is_mobile_user_agent(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 Safari/605.1.15"
        ));
    }

    #[test]
    fn test_url_origin() {
        assert_eq!(url_origin("https://game.example/play?x=1"), "https://game.example");
        assert_eq!(url_origin("http://localhost:8080"), "http://localhost:8080");
        assert_eq!(url_origin("http://localhost:8080#top"), "http://localhost:8080");
        assert_eq!(url_origin("not a url"), "not a url");
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("abc-_.~"), "abc-_.~");
        assert_eq!(encode_uri_component("a b/c?d=é"), "a%20b%2Fc%3Fd%3D%C3%A9");
    }
}
