//! HTTP/1.1 wire format: request serialization and response parsing
//!
//! Framing relies on the server closing the connection; every request
//! carries `Connection: close` and there is no Content-Length or chunked
//! decoding.

use crate::types::Target;

/// Status codes that trigger redirect-following
pub const REDIRECT_CODES: &[u16] = &[301, 302, 303, 307, 308];

/// Status assumed when the status line cannot be parsed
const FALLBACK_STATUS: u16 = 200;

const HEADER_DELIMITER: &[u8] = b"\r\n\r\n";

/// Serialize a GET request for `target`
pub fn build_request(target: &Target, accept: &str, user_agent: &str) -> String {
    format!(
        "GET {} HTTP/1.1\r\n\
         Host: {}\r\n\
         User-Agent: {}\r\n\
         Accept: {}\r\n\
         Connection: close\r\n\
         \r\n",
        target.path,
        target.host_header(),
        user_agent,
        accept
    )
}

/// A parsed response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    /// Header names lower-cased, values trimmed, in wire order
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// First header value matching `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_redirect(&self) -> bool {
        REDIRECT_CODES.contains(&self.status_code)
    }

    /// `Location` of a redirect response; `None` for terminal responses
    pub fn redirect_location(&self) -> Option<&str> {
        if !self.is_redirect() {
            return None;
        }
        self.header("location").filter(|l| !l.is_empty())
    }

    /// Body as text, invalid UTF-8 replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Parse raw response bytes
///
/// Never fails: a missing header delimiter yields an empty header block
/// with the whole input as body, and an unparseable status line yields 200.
pub fn parse_response(raw: &[u8]) -> Response {
    let (head, body) = match find_subslice(raw, HEADER_DELIMITER) {
        Some(pos) => (&raw[..pos], &raw[pos + HEADER_DELIMITER.len()..]),
        None => (&raw[..0], raw),
    };

    let head = decode_latin1(head);
    let mut lines = head.split("\r\n");

    let status_code = lines
        .next()
        .and_then(parse_status_line)
        .unwrap_or(FALLBACK_STATUS);

    let headers = lines
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect();

    Response {
        status_code,
        headers,
        body: body.to_vec(),
    }
}

/// Second whitespace-separated token of the status line
fn parse_status_line(line: &str) -> Option<u16> {
    line.split_whitespace().nth(1)?.parse().ok()
}

/// Headers are not assumed to be UTF-8; map each byte to one char
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
