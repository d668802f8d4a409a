//! Response Module
//!
//! Synthesized HTML error responses sent to the browser.

use crate::error::ErrorStatus;

/// Escapes text that came from the client before embedding it in HTML.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// == Error Page ==
/// Renders a complete HTTP/1.0 error response.
pub fn error_page(status: &ErrorStatus) -> Vec<u8> {
    let body = format!(
        "<html><title>Proxy Error</title><body bgcolor=\"ffffff\">\r\n\
         {code}: {reason}\r\n\
         <p>{detail}: {cause}\r\n\
         <hr><em>Caching Web Proxy</em>\r\n",
        code = status.code,
        reason = status.reason,
        detail = status.detail,
        cause = escape_html(&status.cause),
    );

    let mut response = format!(
        "HTTP/1.0 {} {}\r\nContent-type: text/html\r\nContent-length: {}\r\n\r\n",
        status.code,
        status.reason,
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body.as_bytes());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxyError;

    fn render(err: ProxyError) -> String {
        let status = err.client_status().unwrap();
        String::from_utf8(error_page(&status)).unwrap()
    }

    #[test]
    fn test_not_implemented_page() {
        let page = render(ProxyError::NotImplemented("POST".to_string()));

        assert!(page.starts_with("HTTP/1.0 501 Not Implemented\r\n"));
        assert!(page.contains("Content-type: text/html\r\n"));
        assert!(page.contains("501: Not Implemented\r\n"));
        assert!(page.contains("<p>Proxy does not implement this method: POST\r\n"));
    }

    #[test]
    fn test_content_length_matches_body() {
        let page = render(ProxyError::OriginNotFound("nowhere.test".to_string()));

        let (head, body) = page.split_once("\r\n\r\n").unwrap();
        let declared: usize = head
            .lines()
            .find_map(|l| l.strip_prefix("Content-length: "))
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(declared, body.len());
    }

    #[test]
    fn test_cause_is_escaped() {
        let page = render(ProxyError::MalformedRequest("<script>".to_string()));
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }
}
