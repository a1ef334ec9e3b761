//! Parsing of captured header text.
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

/// Returns the header lines of the last response in `header`.
///
/// Captured text holds one block per response received (redirects, `100
/// Continue`), each opened by its status line. Only the final block is kept.
pub fn final_block(header: &str) -> &str {
    let mut start = 0;
    let mut offset = 0;
    for line in header.split_inclusive('\n') {
        if line.starts_with("HTTP/") {
            start = offset;
        }
        offset += line.len();
    }
    &header[start..]
}

/// Parses the final response's header fields into a case-insensitive map.
///
/// Repeated fields are kept in order. Lines that are not valid header fields
/// (status lines, blank separators, obsolete folding) are skipped.
pub fn parse_header_map(header: &str) -> HeaderMap {
    let mut map = HeaderMap::new();

    for line in final_block(header).lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let Ok(name) = HeaderName::from_bytes(name.trim().as_bytes()) else {
            continue;
        };
        match HeaderValue::from_str(value.trim()) {
            Ok(value) => {
                map.append(name, value);
            }
            Err(e) => log::trace!("Skipping header {}: {}", name, e),
        }
    }

    map
}

/// Status code of the final response's status line, if one was captured.
pub fn final_status(header: &str) -> Option<u16> {
    let status_line = final_block(header).lines().next()?;
    if !status_line.starts_with("HTTP/") {
        return None;
    }
    status_line.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDIRECTED: &str = "HTTP/1.1 302 Found\r\n\
        Location: /next\r\n\
        Set-Cookie: a=1\r\n\
        \r\n\
        HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        X-Multi: one\r\n\
        x-multi: two\r\n\
        \r\n";

    #[test]
    fn final_block_starts_at_last_status_line() {
        let block = final_block(REDIRECTED);
        assert!(block.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(!block.contains("Location"));
    }

    #[test]
    fn header_map_holds_only_final_response() {
        let map = parse_header_map(REDIRECTED);
        assert_eq!(map.get("content-type").unwrap(), "text/html");
        assert!(map.get("location").is_none());
        assert!(map.get("set-cookie").is_none());

        let multi: Vec<_> = map.get_all("X-Multi").iter().map(|v| v.to_str().unwrap()).collect();
        assert_eq!(multi, vec!["one", "two"]);
    }

    #[test]
    fn final_status_reads_last_status_line() {
        assert_eq!(final_status(REDIRECTED), Some(200));
        assert_eq!(final_status(""), None);
        assert_eq!(final_status("X-A: 1\r\n"), None);
    }

    #[test]
    fn text_without_status_line_is_one_block() {
        let map = parse_header_map("X-A: 1\r\nbroken line\r\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x-a").unwrap(), "1");
    }
}
