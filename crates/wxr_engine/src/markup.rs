//! Small helpers shared by the HTML and Markdown passes: attribute parsing,
//! value escaping and the directive (shortcode) writer.
use std::fmt::Write;

use regex::Regex;

/// Characters that break the directive syntax when they appear in a `src`,
/// with their percent-escapes.
const SRC_ESCAPES: &[(char, &str)] = &[(' ', "%20"), ('_', "%5F")];

/// `key="value"`, `key='value'` or `key=value`, as found in HTML tags and
/// WordPress shortcodes alike.
pub(crate) const ATTRIBUTE_PATTERN: &str =
    r#"([A-Za-z_][\w:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>\]]+))"#;

/// Any emitted directive, opening or closing.
pub(crate) const DIRECTIVE_PATTERN: &str = r"(?s)\{\{<.*?>\}\}";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub(crate) fn parse(pattern: &Regex, text: &str) -> Self {
        let pairs = pattern
            .captures_iter(text)
            .map(|caps| {
                let key = caps[1].to_ascii_lowercase();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                (key, value)
            })
            .collect();
        Self(pairs)
    }

    /// First value for `key`, compared case-insensitively.
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Percent-escape the characters that break directive arguments. Everything
/// else, non-ASCII included, is kept verbatim.
pub(crate) fn escape_src(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for c in src.trim().chars() {
        match SRC_ESCAPES.iter().find(|(special, _)| *special == c) {
            Some((_, escaped)) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    out
}

/// Fold every double-quote spelling into an ASCII apostrophe so the value can
/// sit inside a quoted directive argument.
pub(crate) fn unify_quotes(text: &str) -> String {
    const QUOTES: &[&str] = &["&quot;", "&#34;", "&#034;", "&#8220;", "&#8221;", "\"", "\u{201C}", "\u{201D}"];
    QUOTES
        .iter()
        .fold(text.to_string(), |acc, quote| acc.replace(quote, "'"))
}

/// A directive in the target site generator's template syntax, e.g.
/// `{{< figure src="/a.png" >}}`.
#[derive(Debug, Clone)]
pub(crate) struct Directive {
    name: &'static str,
    args: Vec<Arg>,
}

#[derive(Debug, Clone)]
enum Arg {
    Positional(String),
    Quoted(&'static str, String),
    Bare(&'static str, String),
}

impl Directive {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    pub(crate) fn positional(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg::Positional(value.into()));
        self
    }

    pub(crate) fn quoted(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.args.push(Arg::Quoted(key, value.into()));
        self
    }

    /// Quoted argument that is left out when the value is empty.
    pub(crate) fn quoted_opt(self, key: &'static str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.quoted(key, value)
        }
    }

    pub(crate) fn bare(mut self, key: &'static str, value: impl ToString) -> Self {
        self.args.push(Arg::Bare(key, value.to_string()));
        self
    }

    pub(crate) fn render(&self) -> String {
        let mut out = format!("{{{{< {}", self.name);
        for arg in &self.args {
            let _ = match arg {
                Arg::Positional(value) => write!(out, " {value}"),
                Arg::Quoted(key, value) => write!(out, " {key}=\"{value}\""),
                Arg::Bare(key, value) => write!(out, " {key}={value}"),
            };
        }
        out.push_str(" >}}");
        out
    }

    pub(crate) fn closing(name: &str) -> String {
        format!("{{{{< /{name} >}}}}")
    }
}
