//! `Link` header pagination.

/// Relations advertised by a `Link` response header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRelations {
    pub next: Option<String>,
    pub last: Option<String>,
}

/// Parse a GitHub `Link` header.
///
/// The header has the form
/// `<https://api.github.com/...&page=2>; rel="next", <...&page=5>; rel="last"`.
/// Unknown relations and malformed parts are ignored.
pub fn parse_link_header(link_header: &str) -> LinkRelations {
    let mut relations = LinkRelations::default();

    for part in link_header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.split(';') {
            let segment = segment.trim();
            if let Some(inner) = segment
                .strip_prefix('<')
                .and_then(|s| s.strip_suffix('>'))
            {
                url = Some(inner);
            } else if let Some(value) = segment.strip_prefix("rel=") {
                rel = Some(value.trim_matches('"'));
            }
        }

        if let (Some(url), Some(rel)) = (url, rel) {
            match rel {
                "next" => relations.next = Some(url.to_string()),
                "last" => relations.last = Some(url.to_string()),
                _ => {}
            }
        }
    }

    relations
}

/// The `next` page URL, or an empty string when there is none.
pub fn next_page_url(link_header: Option<&str>) -> String {
    link_header
        .map(parse_link_header)
        .and_then(|r| r.next)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_next_and_last() {
        let header = r#"<https://api.github.com/user/repos?page=2>; rel="next", <https://api.github.com/user/repos?page=5>; rel="last""#;
        let rel = parse_link_header(header);
        assert_eq!(
            rel.next.as_deref(),
            Some("https://api.github.com/user/repos?page=2")
        );
        assert_eq!(
            rel.last.as_deref(),
            Some("https://api.github.com/user/repos?page=5")
        );
    }

    #[test]
    fn last_page_has_no_next() {
        let header = r#"<https://api.github.com/user/repos?page=1>; rel="prev", <https://api.github.com/user/repos?page=1>; rel="first""#;
        assert_eq!(next_page_url(Some(header)), "");
    }

    #[test]
    fn missing_header_yields_empty_next() {
        assert_eq!(next_page_url(None), "");
    }

    #[test]
    fn malformed_parts_are_ignored() {
        let header = r#"garbage, <https://x/y?page=3>; rel="next"; foo=bar, <broken; rel="last""#;
        let rel = parse_link_header(header);
        assert_eq!(rel.next.as_deref(), Some("https://x/y?page=3"));
        assert_eq!(rel.last, None);
    }
}
