use serde::Deserialize;
use wxr_logging::wxr_debug;

use crate::fields::NavigationLink;

#[derive(Debug, Deserialize)]
struct BlockAttributes {
    label: Option<String>,
    title: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
}

/// Extract navigation links from the block comments of a `wp_navigation`
/// item, e.g. `<!-- wp:navigation-link {"label":"Home","url":"/"} /-->`.
/// Comments without a JSON object or without a `url` are ignored.
pub fn parse_navigation(html: &str) -> Vec<NavigationLink> {
    let mut links = Vec::new();
    let mut rest = html;
    while let Some(start) = rest.find("<!--") {
        let after_open = &rest[start + 4..];
        let Some(end) = after_open.find("-->") else {
            break;
        };
        if let Some(link) = link_from_comment(&after_open[..end]) {
            links.push(link);
        }
        rest = &after_open[end + 3..];
    }
    links
}

fn link_from_comment(comment: &str) -> Option<NavigationLink> {
    let open = comment.find('{')?;
    let close = comment.rfind('}')?;
    if close < open {
        return None;
    }
    let json = &comment[open..=close];
    let attrs: BlockAttributes = match serde_json::from_str(json) {
        Ok(attrs) => attrs,
        Err(err) => {
            wxr_debug!("Ignoring navigation comment with unreadable attributes: {}", err);
            return None;
        }
    };
    let url = attrs.url?;
    let label = attrs.label.unwrap_or_default();
    let title = attrs.title.unwrap_or_else(|| label.clone());
    Some(NavigationLink {
        label,
        title,
        kind: attrs.kind.unwrap_or_default(),
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_read_in_order_and_title_falls_back_to_label() {
        let html = r#"<!-- wp:navigation-link {"label":"Home","type":"page","id":2,"url":"https://example.com/","kind":"post-type"} /-->
<!-- wp:navigation-link {"label":"About","title":"About us","type":"page","url":"https://example.com/about/"} /-->"#;
        let links = parse_navigation(html);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].title, "Home");
        assert_eq!(links[0].kind, "page");
        assert_eq!(links[1].title, "About us");
        assert_eq!(links[1].url, "https://example.com/about/");
    }

    #[test]
    fn comments_without_json_or_url_are_skipped() {
        let html = "<!-- wp:navigation --><!-- wp:spacer {\"height\":\"20px\"} /--><!-- /wp:navigation -->";
        assert!(parse_navigation(html).is_empty());
    }
}
