use serde::de::DeserializeOwned;
use std::time::Duration;

/// How to talk to a remote HTTP service.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("request to {url} returned {status} {status_text}")]
    Status {
        url: String,
        status: u16,
        status_text: String,
    },
    #[error("could not read the response of {url}: {source}")]
    Body {
        url: String,
        source: std::io::Error,
    },
    #[error("could not decode the response of {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

/// Fetches `request_url` and decodes the JSON body into `T`.
///
/// Blocks until the response has been read completely, so call this from a
/// worker thread only.
pub fn fetch_json<T: DeserializeOwned>(
    request_url: &str,
    settings: &HttpSettings,
) -> Result<T, FetchError> {
    log::trace!("GET {}", request_url);
    let response = ureq::get(request_url)
        .set("User-Agent", &settings.user_agent)
        .set("Accept", "application/json")
        .timeout(settings.timeout)
        .call();

    if let Some(e) = response.synthetic_error() {
        return Err(FetchError::Transport {
            url: request_url.to_string(),
            reason: e.to_string(),
        });
    }

    if !response.ok() {
        return Err(FetchError::Status {
            url: request_url.to_string(),
            status: response.status(),
            status_text: response.status_text().to_string(),
        });
    }

    let body = response.into_string().map_err(|source| FetchError::Body {
        url: request_url.to_string(),
        source,
    })?;

    serde_json::from_str(&body).map_err(|source| FetchError::Decode {
        url: request_url.to_string(),
        source,
    })
}

/// Escapes `input` for use as a single query component.
///
/// Leaves the same characters alone as `encodeURIComponent` does and
/// percent-encodes every other UTF-8 byte.
pub fn encode_component(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
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
            | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Joins a base url and a path without doubling or dropping the slash.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[test]
fn encodes_like_encode_uri_component() {
    assert_eq!(encode_component("London"), "London");
    assert_eq!(encode_component("New York"), "New%20York");
    assert_eq!(encode_component("a&b=c/d?"), "a%26b%3Dc%2Fd%3F");
    assert_eq!(encode_component("Zürich"), "Z%C3%BCrich");
    assert_eq!(encode_component("it's (fine)!~*"), "it's%20(fine)!~*");
}

#[test]
fn joins_urls() {
    assert_eq!(
        join_url("https://nominatim.openstreetmap.org/", "/search"),
        "https://nominatim.openstreetmap.org/search"
    );
    assert_eq!(join_url("http://localhost:5000", "route/v1"), "http://localhost:5000/route/v1");
}

/// Answers a single HTTP request with `status` and `body`. Returns the base url.
#[cfg(test)]
pub(crate) fn serve_once(status: &str, body: &str) -> String {
    use std::io::{BufRead, BufReader, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
            line.clear();
        }
        reader.get_mut().write_all(response.as_bytes()).unwrap();
    });
    format!("http://{}", address)
}

#[cfg(test)]
fn test_settings(base_url: &str) -> HttpSettings {
    HttpSettings {
        base_url: base_url.to_string(),
        user_agent: "wayfinder-test".into(),
        timeout: Duration::from_secs(5),
    }
}

#[test]
fn decodes_json_bodies() {
    let url = serve_once("200 OK", "[1, 2, 3]");
    let numbers: Vec<u32> = fetch_json(&url, &test_settings(&url)).unwrap();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn undecodable_body_is_a_decode_error() {
    let url = serve_once("200 OK", "<html>Service Unavailable</html>");
    let result = fetch_json::<Vec<u32>>(&url, &test_settings(&url));
    assert!(matches!(result, Err(FetchError::Decode { .. })));
}

#[test]
fn error_status_is_reported() {
    let url = serve_once("503 Service Unavailable", "{}");
    match fetch_json::<serde_json::Value>(&url, &test_settings(&url)) {
        Err(FetchError::Status { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected a status error, got {:?}", other),
    }
}

#[test]
fn unreachable_host_is_a_transport_error() {
    // Nobody listens on a port that was just released.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let result = fetch_json::<serde_json::Value>(&url, &test_settings(&url));
    assert!(matches!(result, Err(FetchError::Transport { .. })));
}
