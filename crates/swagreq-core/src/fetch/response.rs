//! Raw HTTP response parsing.
//!
//! Two interchangeable parsers implement [`ResponseParser`]: a structured one
//! built on `httparse`, and a manual splitter that works on anything with a
//! blank-line header boundary. The fetcher tries them in order.

const MAX_HEADERS: usize = 128;

/// Status, headers and body text of one response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawResponse {
    /// `0` when the status line could not be read.
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// First header with this name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or("")
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode a `Transfer-Encoding: chunked` body in place. Bodies with other
    /// encodings, or malformed chunk framing, are left untouched.
    pub fn dechunk(&mut self) {
        let chunked = self
            .header("transfer-encoding")
            .is_some_and(|te| te.to_ascii_lowercase().contains("chunked"));
        if !chunked {
            return;
        }
        if let Some(decoded) = decode_chunked(&self.body) {
            self.body = decoded;
        }
    }
}

/// One way of turning response bytes into a [`RawResponse`].
pub trait ResponseParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` means this parser cannot handle the input and the next one
    /// should be tried.
    fn parse(&self, raw: &[u8]) -> Option<RawResponse>;
}

/// `httparse`-based parser. Declines incomplete heads, oversized header
/// sections and anything that is not valid HTTP/1.x.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredParser;

impl ResponseParser for StructuredParser {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn parse(&self, raw: &[u8]) -> Option<RawResponse> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut response = httparse::Response::new(&mut headers);
        let offset = match response.parse(raw) {
            Ok(httparse::Status::Complete(offset)) => offset,
            Ok(httparse::Status::Partial) => return None,
            Err(err) => {
                log::debug!("structured response parse failed: {err}");
                return None;
            }
        };
        Some(RawResponse {
            status: response.code.unwrap_or(0),
            headers: response
                .headers
                .iter()
                .map(|h| {
                    (
                        h.name.to_string(),
                        String::from_utf8_lossy(h.value).trim().to_string(),
                    )
                })
                .collect(),
            body: raw[offset..].to_vec(),
        })
    }
}

/// Split-on-boundary parser. Never declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualParser;

impl ResponseParser for ManualParser {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn parse(&self, raw: &[u8]) -> Option<RawResponse> {
        let text = String::from_utf8_lossy(raw);
        let (head, body) = match text.split_once("\r\n\r\n") {
            Some((head, body)) => (head, body),
            None => (text.as_ref(), ""),
        };
        let mut lines = head.split("\r\n");
        let first = lines.next().unwrap_or("");
        let status = if first.starts_with("HTTP/") {
            first
                .split(' ')
                .nth(1)
                .and_then(|code| code.parse().ok())
                .unwrap_or(0)
        } else {
            0
        };
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();
        Some(RawResponse {
            status,
            headers,
            body: body.as_bytes().to_vec(),
        })
    }
}

/// The default parser order: structured first, manual as fallback.
pub fn default_parsers() -> Vec<Box<dyn ResponseParser>> {
    vec![Box::new(StructuredParser), Box::new(ManualParser)]
}

/// Run the parsers in order and return the first result with the name of the
/// parser that produced it.
pub fn parse_with(
    parsers: &[Box<dyn ResponseParser>],
    raw: &[u8],
) -> Option<(&'static str, RawResponse)> {
    parsers
        .iter()
        .find_map(|p| p.parse(raw).map(|response| (p.name(), response)))
}

fn decode_chunked(mut input: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        let httparse::Status::Complete((consumed, size)) =
            httparse::parse_chunk_size(input).ok()?
        else {
            return None;
        };
        input = &input[consumed..];
        if size == 0 {
            return Some(out);
        }
        let size = usize::try_from(size).ok()?;
        if input.len() < size {
            return None;
        }
        out.extend_from_slice(&input[..size]);
        input = input[size..].strip_prefix(b"\r\n")?;
    }
}
