//! `Link` header parsing for cursor pagination
//!
//! The listing endpoints advertise the next page as
//! `<https://host/signatories?page=2>; rel="next"`. The quotes around `next`
//! are optional. Headers with several comma-separated links, extra
//! parameters, or space-separated relation lists are handled too.

use regex::Regex;
use std::sync::LazyLock;

/// One `<url>; params` link value
static LINK_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>]*)>([^<]*)").expect("link value pattern"));

/// Extract the `rel=next` target from a `Link` header.
///
/// Absent, malformed, or next-less metadata yields `None`.
pub fn parse_next_link(header: Option<&str>) -> Option<String> {
    let header = header?;

    LINK_VALUE
        .captures_iter(header)
        .find(|caps| caps.get(2).is_some_and(|params| has_next_rel(params.as_str())))
        .and_then(|caps| caps.get(1))
        .map(|url| url.as_str().trim().to_string())
        .filter(|url| !url.is_empty())
}

fn has_next_rel(params: &str) -> bool {
    params
        .split(';')
        .filter_map(|param| param.split_once('='))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case("rel"))
        .any(|(_, value)| {
            value
                .trim()
                .trim_end_matches(',')
                .trim()
                .trim_matches('"')
                .split_whitespace()
                .any(|rel| rel.eq_ignore_ascii_case("next"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_header() {
        assert_eq!(parse_next_link(None), None);
        assert_eq!(parse_next_link(Some("")), None);
    }

    #[test]
    fn test_unquoted_and_quoted_rel() {
        assert_eq!(
            parse_next_link(Some("<https://x/p2>; rel=next")).as_deref(),
            Some("https://x/p2")
        );
        assert_eq!(
            parse_next_link(Some(r#"<https://x/p2>; rel="next""#)).as_deref(),
            Some("https://x/p2")
        );
    }

    #[test]
    fn test_prev_only_yields_none() {
        assert_eq!(parse_next_link(Some("<https://x/p1>; rel=prev")), None);
        assert_eq!(parse_next_link(Some(r#"<https://x/p1>; rel="prev""#)), None);
    }

    #[test]
    fn test_malformed_does_not_panic() {
        for header in ["garbage", "<unterminated; rel=next", "rel=next", ">; rel=next<", "<>; rel=next"] {
            assert_eq!(parse_next_link(Some(header)), None, "header: {header}");
        }
    }

    #[test]
    fn test_picks_next_among_several_links() {
        let header = r#"<https://x/p1>; rel="prev", <https://x/p3>; rel="next", <https://x/p9>; rel="last""#;
        assert_eq!(parse_next_link(Some(header)).as_deref(), Some("https://x/p3"));
    }

    #[test]
    fn test_extra_params_and_rel_lists() {
        assert_eq!(
            parse_next_link(Some(r#"<https://x/p2>; title="more"; REL="next last""#)).as_deref(),
            Some("https://x/p2")
        );
        assert_eq!(
            parse_next_link(Some("</signatories?page=2&per_page=30> ;rel = next")).as_deref(),
            Some("/signatories?page=2&per_page=30")
        );
    }

    #[test]
    fn test_nextish_relations_do_not_match() {
        assert_eq!(parse_next_link(Some("<https://x/p2>; rel=nextpage")), None);
        assert_eq!(parse_next_link(Some("<https://x/p2>; anchor=next")), None);
    }
}
