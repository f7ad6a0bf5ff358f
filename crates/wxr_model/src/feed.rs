use std::collections::BTreeMap;

/// Namespaced extension fields keyed by qualified name, e.g. `wp:post_type`.
pub type Extensions = BTreeMap<String, Vec<ExtensionNode>>;

/// One namespaced element with its text, attributes and nested extension elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionNode {
    pub value: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Extensions,
}

impl ExtensionNode {
    /// Text of the first child with the given qualified name.
    pub fn child_value(&self, name: &str) -> Option<&str> {
        first_value(&self.children, name)
    }
}

/// Text of the first extension with the given qualified name.
pub fn first_value<'a>(extensions: &'a Extensions, name: &str) -> Option<&'a str> {
    extensions
        .get(name)
        .and_then(|nodes| nodes.first())
        .map(|node| node.value.as_str())
}

/// A `<category>` element on an item. WordPress puts categories, tags and
/// post formats in the same element and tells them apart with `domain`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCategory {
    pub domain: Option<String>,
    pub nicename: Option<String>,
    pub name: String,
}

/// RSS channel with its WordPress extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub pub_date: Option<String>,
    pub extensions: Extensions,
    pub items: Vec<RawItem>,
}

/// RSS item with its WordPress extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    pub pub_date: Option<String>,
    /// `dc:creator`
    pub author: String,
    pub guid: String,
    pub description: String,
    /// `content:encoded`
    pub content: String,
    /// `excerpt:encoded`
    pub excerpt: String,
    pub categories: Vec<RawCategory>,
    pub extensions: Extensions,
}

impl RawItem {
    pub fn extension(&self, name: &str) -> Option<&str> {
        first_value(&self.extensions, name)
    }

    pub fn extensions_named(&self, name: &str) -> &[ExtensionNode] {
        self.extensions
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl RawFeed {
    pub fn extensions_named(&self, name: &str) -> &[ExtensionNode] {
        self.extensions
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
