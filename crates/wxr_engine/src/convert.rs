//! HTML to Markdown conversion: `html2md` does the generic work, and
//! [`ConversionRule`]s take over elements it cannot express.
//!
//! Rules run on the HTML before `html2md` sees it. Whatever a rule renders is
//! parked behind an opaque token and put back verbatim afterwards, so
//! `html2md`'s Markdown escaping never touches directive syntax.
use std::panic::{self, AssertUnwindSafe};

use regex::{Captures, Regex};

use crate::markup::{Attributes, Directive, ATTRIBUTE_PATTERN, DIRECTIVE_PATTERN};
use crate::normalize::{LINE_BREAK_MARKER, PARAGRAPH_BREAK_MARKER};
use crate::settings::ConvertSettings;

/// WordPress "read more" split point, kept in the Markdown until the
/// post-processing pass consumes it.
pub const MORE_MARKER: &str = "<!--more-->";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("conversion produced no output for non-empty HTML")]
    EmptyOutput,
    #[error("html converter failed: {0}")]
    Internal(String),
}

pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> Result<String, ConvertError>;
}

/// A rewrite for one kind of element. `render` returns `None` to leave a
/// match for later rules and the generic converter.
pub trait ConversionRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn pattern(&self) -> &Regex;
    fn render(&self, caps: &Captures<'_>) -> Option<String>;
}

pub struct Html2MdConverter {
    rules: Vec<Box<dyn ConversionRule>>,
    markup: Regex,
    paragraph_break: Regex,
    line_break: Regex,
}

impl Default for Html2MdConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Html2MdConverter {
    /// Plain `html2md` with line-break marker handling and no rules.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            markup: Regex::new(r"(?s)<!--.*?-->|<[^>]+>").expect("valid regex"),
            paragraph_break: Regex::new(&format!(r"[ \t]*{PARAGRAPH_BREAK_MARKER}[ \t]*"))
                .expect("valid regex"),
            line_break: Regex::new(&format!(r"[ \t]*{LINE_BREAK_MARKER}[ \t]*"))
                .expect("valid regex"),
        }
    }

    /// Converter with every WordPress rule, in precedence order.
    pub fn wordpress(settings: &ConvertSettings) -> Self {
        Self::new()
            .with_rule(CodeBlockRule::new())
            .with_rule(DirectiveRule::new())
            .with_rule(MoreMarkerRule::new())
            .with_rule(YouTubeIframeRule::new())
            .with_rule(GoogleMapsIframeRule::new(settings))
            .with_rule(GistLinkRule::new())
    }

    pub fn with_rule(mut self, rule: impl ConversionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    fn has_visible_text(&self, html: &str) -> bool {
        !self.markup.replace_all(html, "").trim().is_empty()
    }
}

impl Converter for Html2MdConverter {
    fn to_markdown(&self, html: &str) -> Result<String, ConvertError> {
        if html.trim().is_empty() {
            return Ok(String::new());
        }

        let mut stash = Stash::default();
        let prepared = self.rules.iter().fold(html.to_string(), |acc, rule| {
            rule.pattern()
                .replace_all(&acc, |caps: &Captures| match rule.render(caps) {
                    Some(text) => stash.push(text),
                    None => caps[0].to_string(),
                })
                .into_owned()
        });

        let converted = panic::catch_unwind(AssertUnwindSafe(|| html2md::parse_html(&prepared)))
            .map_err(|payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                ConvertError::Internal(message)
            })?;

        let restored = stash.restore(&converted);
        let markdown = self.paragraph_break.replace_all(&restored, "\n\n");
        let markdown = self.line_break.replace_all(&markdown, "  \n").into_owned();

        if markdown.trim().is_empty() && (self.has_visible_text(html) || !stash.is_empty()) {
            return Err(ConvertError::EmptyOutput);
        }
        Ok(markdown)
    }
}

/// Rendered rule output waiting to be put back after generic conversion.
/// Tokens are letters and digits only so `html2md` passes them through.
#[derive(Debug, Default)]
struct Stash {
    entries: Vec<String>,
}

impl Stash {
    fn push(&mut self, text: String) -> String {
        let token = Self::token(self.entries.len());
        self.entries.push(text);
        token
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn token(index: usize) -> String {
        format!("WXRSTASH{index}X")
    }

    /// Later entries may embed earlier tokens, so restore newest first.
    fn restore(&self, markdown: &str) -> String {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .fold(markdown.to_string(), |acc, (index, text)| {
                acc.replace(&Self::token(index), text)
            })
    }
}

/// Canonical `<pre><code class="lang">` blocks become fenced code.
pub struct CodeBlockRule {
    pattern: Regex,
}

impl CodeBlockRule {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r#"(?s)<pre><code(?: class="([^"]*)")?>(.*?)</code></pre>"#)
                .expect("valid regex"),
        }
    }
}

impl Default for CodeBlockRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionRule for CodeBlockRule {
    fn name(&self) -> &'static str {
        "code block"
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn render(&self, caps: &Captures<'_>) -> Option<String> {
        let lang = caps.get(1).map_or("", |m| m.as_str());
        let body = html_escape::decode_html_entities(&caps[2])
            .replace(PARAGRAPH_BREAK_MARKER, "\n\n")
            .replace(LINE_BREAK_MARKER, "\n");
        let body = body.trim_matches('\n');
        Some(format!("\n\n```{lang}\n{body}\n```\n\n"))
    }
}

/// Directives emitted by the normalizer pass through untouched. Adjacent
/// directives are kept together so multi-line ones keep their layout.
pub struct DirectiveRule {
    pattern: Regex,
}

impl DirectiveRule {
    pub fn new() -> Self {
        let single = DIRECTIVE_PATTERN.trim_start_matches("(?s)");
        Self {
            pattern: Regex::new(&format!(r"(?s){single}(?:\s*{single})*")).expect("valid regex"),
        }
    }
}

impl Default for DirectiveRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionRule for DirectiveRule {
    fn name(&self) -> &'static str {
        "directive"
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn render(&self, caps: &Captures<'_>) -> Option<String> {
        let text = &caps[0];
        if text.contains('\n') {
            Some(format!("\n\n{text}\n\n"))
        } else {
            Some(text.to_string())
        }
    }
}

/// Keeps `<!--more-->`, which `html2md` would drop with the other comments.
pub struct MoreMarkerRule {
    pattern: Regex,
}

impl MoreMarkerRule {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"<!--\s*more\s*-->").expect("valid regex"),
        }
    }
}

impl Default for MoreMarkerRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionRule for MoreMarkerRule {
    fn name(&self) -> &'static str {
        "more marker"
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn render(&self, _caps: &Captures<'_>) -> Option<String> {
        Some(MORE_MARKER.to_string())
    }
}

const IFRAME_PATTERN: &str = r"(?is)<iframe\b([^>]*)>.*?</iframe>";

pub struct YouTubeIframeRule {
    pattern: Regex,
    attribute: Regex,
    video_id: Regex,
}

impl YouTubeIframeRule {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(IFRAME_PATTERN).expect("valid regex"),
            attribute: Regex::new(ATTRIBUTE_PATTERN).expect("valid regex"),
            video_id: Regex::new(r"youtube\.com/embed/([A-Za-z0-9_-]+)").expect("valid regex"),
        }
    }
}

impl Default for YouTubeIframeRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionRule for YouTubeIframeRule {
    fn name(&self) -> &'static str {
        "youtube iframe"
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn render(&self, caps: &Captures<'_>) -> Option<String> {
        let attrs = Attributes::parse(&self.attribute, &caps[1]);
        let src = attrs.get("src").filter(|src| src.contains("youtube.com"))?;
        let id = self.video_id.captures(src)?;
        Some(Directive::new("youtube").positional(&id[1]).render())
    }
}

pub struct GoogleMapsIframeRule {
    pattern: Regex,
    attribute: Regex,
    map_id: Regex,
    default_width: u32,
    default_height: u32,
}

impl GoogleMapsIframeRule {
    pub fn new(settings: &ConvertSettings) -> Self {
        Self {
            pattern: Regex::new(IFRAME_PATTERN).expect("valid regex"),
            attribute: Regex::new(ATTRIBUTE_PATTERN).expect("valid regex"),
            map_id: Regex::new(r"google\.com/maps/d/(?:u/\d+/)?embed\?mid=([^&\s]+)")
                .expect("valid regex"),
            default_width: settings.default_map_width,
            default_height: settings.default_map_height,
        }
    }
}

impl ConversionRule for GoogleMapsIframeRule {
    fn name(&self) -> &'static str {
        "google maps iframe"
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn render(&self, caps: &Captures<'_>) -> Option<String> {
        let attrs = Attributes::parse(&self.attribute, &caps[1]);
        let id = self.map_id.captures(attrs.get("src")?)?;
        let width = attrs
            .non_empty("width")
            .map(str::to_string)
            .unwrap_or_else(|| self.default_width.to_string());
        let height = attrs
            .non_empty("height")
            .map(str::to_string)
            .unwrap_or_else(|| self.default_height.to_string());
        Some(
            Directive::new("googlemaps")
                .quoted("id", &id[1])
                .quoted("width", width)
                .quoted("height", height)
                .render(),
        )
    }
}

pub struct GistLinkRule {
    pattern: Regex,
    attribute: Regex,
    gist: Regex,
}

impl GistLinkRule {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"(?is)<a\b([^>]*)>.*?</a>").expect("valid regex"),
            attribute: Regex::new(ATTRIBUTE_PATTERN).expect("valid regex"),
            gist: Regex::new(r"^https?://gist\.github\.com/([^/\s]+)/([0-9A-Za-z]+)/?$")
                .expect("valid regex"),
        }
    }
}

impl Default for GistLinkRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionRule for GistLinkRule {
    fn name(&self) -> &'static str {
        "gist link"
    }

    fn pattern(&self) -> &Regex {
        &self.pattern
    }

    fn render(&self, caps: &Captures<'_>) -> Option<String> {
        let attrs = Attributes::parse(&self.attribute, &caps[1]);
        let gist = self.gist.captures(attrs.get("href")?.trim())?;
        Some(
            Directive::new("gist")
                .positional(&gist[1])
                .positional(&gist[2])
                .render(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Stash;

    #[test]
    fn stash_tokens_do_not_collide_and_nest() {
        let mut stash = Stash::default();
        let mut tokens = Vec::new();
        for i in 0..12 {
            tokens.push(stash.push(format!("<{i}>")));
        }
        let nested = stash.push(format!("[{}]", tokens[1]));
        let text = format!("{} {} {}", tokens[1], tokens[11], nested);
        assert_eq!(stash.restore(&text), "<1> <11> [<1>]");
    }
}
