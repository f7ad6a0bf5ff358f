use std::borrow::Cow;
use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::feed::{ExtensionNode, Extensions, RawCategory, RawFeed, RawItem};

/// Form feed. WordPress exports are known to emit it and XML 1.0 forbids it.
const FORM_FEED: u8 = 0x0C;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("malformed feed XML at byte {position}: {message}")]
    Parse { position: u64, message: String },
    #[error("feed has no <rss><channel> element")]
    MissingChannel,
}

/// Decode a WXR export: drop invalid control characters, then parse RSS 2.0
/// with the WordPress namespace extensions.
pub fn decode_feed(bytes: &[u8]) -> Result<RawFeed, FeedError> {
    let cleaned = strip_invalid_chars(bytes);
    let root = parse_tree(&cleaned)?;
    let channel = root
        .child("rss")
        .and_then(|rss| rss.child("channel"))
        .ok_or(FeedError::MissingChannel)?;
    Ok(build_feed(channel))
}

/// Remove every form feed byte. Borrows when there is nothing to remove.
pub fn strip_invalid_chars(bytes: &[u8]) -> Cow<'_, [u8]> {
    if bytes.contains(&FORM_FEED) {
        Cow::Owned(bytes.iter().copied().filter(|b| *b != FORM_FEED).collect())
    } else {
        Cow::Borrowed(bytes)
    }
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: BTreeMap<String, String>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart) -> Self {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let attrs = start
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                (key, value)
            })
            .collect();
        Self {
            name,
            attrs,
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn child_text(&self, name: &str) -> String {
        self.child(name)
            .map(|c| c.text.trim().to_string())
            .unwrap_or_default()
    }

    fn is_extension(&self) -> bool {
        self.name.contains(':')
    }

    fn to_extension(&self) -> ExtensionNode {
        let mut children = Extensions::new();
        for child in &self.children {
            children
                .entry(child.name.clone())
                .or_default()
                .push(child.to_extension());
        }
        ExtensionNode {
            value: self.text.trim().to_string(),
            attrs: self.attrs.clone(),
            children,
        }
    }
}

fn parse_tree(xml: &[u8]) -> Result<Element, FeedError> {
    let mut reader = Reader::from_reader(xml);
    let mut stack = vec![Element::default()];
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| FeedError::Parse {
                position: reader.buffer_position() as u64,
                message: err.to_string(),
            })?;
        match event {
            Event::Start(start) => stack.push(Element::open(&start)),
            Event::Empty(start) => {
                let element = Element::open(&start);
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::End(_) => {
                let element = stack.pop();
                match (element, stack.last_mut()) {
                    (Some(element), Some(parent)) => parent.children.push(element),
                    _ => {
                        return Err(FeedError::Parse {
                            position: reader.buffer_position() as u64,
                            message: "closing tag without matching opening tag".into(),
                        })
                    }
                }
            }
            Event::Text(text) => {
                // Entities outside XML's five (e.g. `&nbsp;`) are kept verbatim.
                let decoded = match text.unescape() {
                    Ok(value) => value.into_owned(),
                    Err(_) => String::from_utf8_lossy(&text).into_owned(),
                };
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&decoded);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if stack.len() != 1 {
        return Err(FeedError::Parse {
            position: reader.buffer_position() as u64,
            message: format!("unexpected end of document, {} element(s) left open", stack.len() - 1),
        });
    }
    Ok(stack.pop().unwrap_or_default())
}

fn build_feed(channel: &Element) -> RawFeed {
    let mut feed = RawFeed {
        title: channel.child_text("title"),
        link: channel.child_text("link"),
        description: channel.child_text("description"),
        language: channel.child_text("language"),
        pub_date: non_empty(channel.child_text("pubDate")),
        ..RawFeed::default()
    };

    for child in &channel.children {
        if child.name == "item" {
            feed.items.push(build_item(child));
        } else if child.is_extension() {
            feed.extensions
                .entry(child.name.clone())
                .or_default()
                .push(child.to_extension());
        }
    }
    feed
}

fn build_item(element: &Element) -> RawItem {
    let mut item = RawItem::default();
    for child in &element.children {
        match child.name.as_str() {
            "title" => item.title = child.text.trim().to_string(),
            "link" => item.link = child.text.trim().to_string(),
            "pubDate" => item.pub_date = non_empty(child.text.trim().to_string()),
            "dc:creator" => item.author = child.text.trim().to_string(),
            "guid" => item.guid = child.text.trim().to_string(),
            "description" => item.description = child.text.trim().to_string(),
            "content:encoded" => item.content = child.text.clone(),
            "excerpt:encoded" => item.excerpt = child.text.clone(),
            "category" => item.categories.push(RawCategory {
                domain: child.attrs.get("domain").cloned(),
                nicename: child.attrs.get("nicename").cloned(),
                name: child.text.trim().to_string(),
            }),
            _ if child.is_extension() => item
                .extensions
                .entry(child.name.clone())
                .or_default()
                .push(child.to_extension()),
            _ => {}
        }
    }
    item
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_feed_is_removed_everywhere() {
        let cleaned = strip_invalid_chars(b"a\x0cb\x0c\x0cc");
        assert_eq!(cleaned.as_ref(), b"abc");
    }

    #[test]
    fn clean_input_is_borrowed() {
        let cleaned = strip_invalid_chars(b"plain");
        assert!(matches!(cleaned, Cow::Borrowed(_)));
    }

    #[test]
    fn cdata_and_entities_are_both_decoded() {
        let xml = b"<rss><channel><title>A &amp; B</title><item><title><![CDATA[<b>x</b>]]></title></item></channel></rss>";
        let feed = decode_feed(xml).unwrap();
        assert_eq!(feed.title, "A & B");
        assert_eq!(feed.items[0].title, "<b>x</b>");
    }

    #[test]
    fn unclosed_elements_are_a_parse_error() {
        let err = decode_feed(b"<rss><channel><item>").unwrap_err();
        assert!(matches!(err, FeedError::Parse { .. }));
    }

    #[test]
    fn missing_channel_is_reported() {
        let err = decode_feed(b"<rss></rss>").unwrap_err();
        assert_eq!(err, FeedError::MissingChannel);
    }
}
