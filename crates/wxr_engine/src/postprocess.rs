//! Cleanup over the generated Markdown. Every step is total and the whole
//! pass is idempotent: running it on its own output changes nothing.
use regex::{Captures, Regex};
use wxr_logging::{wxr_trace, wxr_warn};
use wxr_model::{normalize_term, Footnote};

use crate::convert::MORE_MARKER;
use crate::markup::{Attributes, Directive, ATTRIBUTE_PATTERN, DIRECTIVE_PATTERN};
use crate::settings::ConvertSettings;

pub struct PostContext<'a> {
    /// Title or link of the item being converted, used in log lines.
    pub item: &'a str,
    /// Host whose absolute links become site-relative.
    pub site_host: Option<&'a str>,
    pub footnotes: &'a [Footnote],
    pub settings: &'a ConvertSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub markdown: String,
    /// Plain text before the read-more marker, if the body had one.
    pub summary: Option<String>,
}

type Step = fn(&MarkdownPostProcessor, &str, &PostContext<'_>) -> String;

const STEPS: &[(&str, Step)] = &[
    ("relative links", MarkdownPostProcessor::relative_links),
    ("catlist", MarkdownPostProcessor::catlist),
    ("footnotes", MarkdownPostProcessor::footnotes),
    ("ordered lists", MarkdownPostProcessor::ordered_lists),
    ("blank lines", MarkdownPostProcessor::blank_lines),
    ("youtube urls", MarkdownPostProcessor::youtube_urls),
];

pub struct MarkdownPostProcessor {
    attribute: Regex,
    catlist: Regex,
    ordered_item: Regex,
    whitespace_line: Regex,
    extra_newlines: Regex,
    token: Regex,
    youtube_url: Regex,
    directive: Regex,
    heading: Regex,
    setext_underline: Regex,
}

impl Default for MarkdownPostProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownPostProcessor {
    pub fn new() -> Self {
        let re = |pattern: &str| Regex::new(pattern).expect("valid regex");
        Self {
            attribute: re(ATTRIBUTE_PATTERN),
            catlist: re(r"\[catlist\b([^\]]*)\]"),
            ordered_item: re(r"^(\s*)\d+\.( )"),
            whitespace_line: re(r"(?m)^[ \t]+$"),
            extra_newlines: re(r"\n{3,}"),
            token: re(r"\S+"),
            youtube_url: re(
                r"^https?://(?:(?:www\.|m\.)?youtube\.com/watch\?v=|youtu\.be/)((?:[A-Za-z0-9-]|\\?_)+)(?:[&?#]\S*)?$",
            ),
            directive: re(DIRECTIVE_PATTERN),
            heading: re(r"^#{1,6}\s+\S"),
            setext_underline: re(r"^(?:=+|-+)[ \t]*$"),
        }
    }

    pub fn process(&self, markdown: &str, ctx: &PostContext<'_>) -> Processed {
        let markdown = STEPS.iter().fold(markdown.to_string(), |acc, (name, step)| {
            let out = step(self, &acc, ctx);
            if out != acc {
                wxr_trace!("{}: post-processing step {:?} rewrote the body", ctx.item, name);
            }
            out
        });
        let (markdown, summary) = self.split_summary(&markdown);
        Processed {
            markdown: markdown.trim().to_string(),
            summary,
        }
    }

    /// `http(s)://<site-host>/` becomes `/`. The host is matched literally.
    pub fn relative_links(&self, markdown: &str, ctx: &PostContext<'_>) -> String {
        match ctx.site_host.filter(|host| !host.is_empty()) {
            Some(host) => ["https", "http"]
                .iter()
                .fold(markdown.to_string(), |acc, scheme| {
                    acc.replace(&format!("{scheme}://{host}/"), "/")
                }),
            None => markdown.to_string(),
        }
    }

    /// List Category Posts shortcodes become a catlist directive.
    pub fn catlist(&self, markdown: &str, ctx: &PostContext<'_>) -> String {
        self.catlist
            .replace_all(markdown, |caps: &Captures| {
                let raw = caps[1].replace("\\_", "_");
                let attrs = Attributes::parse(&self.attribute, &raw);
                let Some(name) = attrs.non_empty("name").or_else(|| attrs.non_empty("category"))
                else {
                    wxr_warn!("{}: catlist shortcode without a category: {}", ctx.item, &caps[0]);
                    return caps[0].to_string();
                };
                let catlink = attrs
                    .non_empty("catlink")
                    .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "yes" | "true" | "1"));
                let count = attrs
                    .non_empty("numberposts")
                    .and_then(|n| n.parse::<i64>().ok())
                    .unwrap_or(ctx.settings.default_catlist_count);
                Directive::new("catlist")
                    .quoted("category", normalize_term(name))
                    .bare("catlink", catlink)
                    .bare("count", count)
                    .render()
            })
            .into_owned()
    }

    /// Anchor references to each footnote become `[^n]` in declaration
    /// order, followed by the definitions.
    pub fn footnotes(&self, markdown: &str, ctx: &PostContext<'_>) -> String {
        if ctx.footnotes.is_empty() {
            return markdown.to_string();
        }
        let mut out = markdown.to_string();
        for (index, footnote) in ctx.footnotes.iter().enumerate() {
            // The converter keeps <sup> as raw HTML, so the anchor may still be a tag.
            let id = regex::escape(&footnote.id);
            let pattern = format!(
                r#"(?:<sup\b[^>]*>\s*)?(?:\[[^\]]*\]\(#{id}\)|<a\b[^>]*href=["']#{id}["'][^>]*>[^<]*</a>)(?:\s*</sup>)?"#
            );
            match Regex::new(&pattern) {
                Ok(reference) => {
                    let replacement = format!("[^{}]", index + 1);
                    out = reference
                        .replace_all(&out, regex::NoExpand(&replacement))
                        .into_owned();
                }
                Err(err) => wxr_warn!("{}: footnote {:?} skipped: {}", ctx.item, footnote.id, err),
            }
        }
        if out.contains("[^1]:") {
            return out;
        }
        let definitions: Vec<String> = ctx
            .footnotes
            .iter()
            .enumerate()
            .map(|(index, footnote)| {
                let content = footnote.content.split_whitespace().collect::<Vec<_>>().join(" ");
                format!("[^{}]: {}", index + 1, content)
            })
            .collect();
        format!("{}\n\n{}\n", out.trim_end(), definitions.join("\n"))
    }

    /// Every ordered-list marker becomes `1.`; the renderer numbers them.
    pub fn ordered_lists(&self, markdown: &str, _ctx: &PostContext<'_>) -> String {
        map_outside_fences(markdown, |line| {
            self.ordered_item.replace(line, "${1}1.${2}").into_owned()
        })
    }

    /// Whitespace-only lines are emptied, then blank runs collapse to one.
    pub fn blank_lines(&self, markdown: &str, _ctx: &PostContext<'_>) -> String {
        let markdown = self.whitespace_line.replace_all(markdown, "");
        self.extra_newlines.replace_all(&markdown, "\n\n").into_owned()
    }

    /// Bare YouTube watch URLs become embeds. URLs that are part of a larger
    /// token (Markdown links, HTML attributes) are left alone.
    pub fn youtube_urls(&self, markdown: &str, _ctx: &PostContext<'_>) -> String {
        map_outside_fences(markdown, |line| {
            self.token
                .replace_all(line, |caps: &Captures| match self.youtube_url.captures(&caps[0]) {
                    Some(url) => Directive::new("youtube")
                        .positional(url[1].replace('\\', ""))
                        .render(),
                    None => caps[0].to_string(),
                })
                .into_owned()
        })
    }

    /// Split at the first read-more marker. The summary is plain text, so
    /// directives are dropped from it.
    pub fn split_summary(&self, markdown: &str) -> (String, Option<String>) {
        let Some((before, after)) = markdown.split_once(MORE_MARKER) else {
            return (markdown.to_string(), None);
        };
        let summary = self.directive.replace_all(before, "");
        let summary = summary.trim();
        let body = match (before.trim_end(), after.trim_start()) {
            ("", rest) => rest.to_string(),
            (head, "") => head.to_string(),
            (head, rest) => format!("{head}\n\n{rest}"),
        };
        let summary = (!summary.is_empty()).then(|| summary.to_string());
        (body, summary)
    }

    /// Headings outside fenced code blocks, both `# Title` and the
    /// underlined form the converter uses for `h1` and `h2`.
    pub fn heading_count(&self, markdown: &str) -> usize {
        let mut in_fence = false;
        let mut previous = "";
        let mut count = 0;
        for line in markdown.lines() {
            if is_fence(line) {
                in_fence = !in_fence;
                previous = "";
                continue;
            }
            if in_fence {
                continue;
            }
            if self.heading.is_match(line) {
                count += 1;
            } else if self.setext_underline.is_match(line) && !previous.trim().is_empty() {
                count += 1;
                previous = "";
                continue;
            }
            previous = line;
        }
        count
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Apply `f` to every line outside fenced code blocks, keeping line endings.
fn map_outside_fences(markdown: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut in_fence = false;
    let mut out = String::with_capacity(markdown.len());
    for line in markdown.split_inclusive('\n') {
        if is_fence(line) {
            in_fence = !in_fence;
            out.push_str(line);
        } else if in_fence {
            out.push_str(line);
        } else {
            let (text, ending) = match line.strip_suffix('\n') {
                Some(text) => (text, "\n"),
                None => (line, ""),
            };
            out.push_str(&f(text));
            out.push_str(ending);
        }
    }
    out
}
