//! Text-level rewrites applied to raw WordPress HTML before the generic
//! Markdown conversion. Each step is total and leaves input without its
//! target pattern untouched; the order of [`STEPS`] matters.
use regex::{Captures, Regex};
use wxr_logging::{wxr_debug, wxr_trace, wxr_warn};
use wxr_model::ImageUrlProvider;

use crate::markup::{escape_src, unify_quotes, Attributes, Directive, ATTRIBUTE_PATTERN};
use crate::settings::ConvertSettings;

/// Replaces runs of two or more `<br>`; becomes a blank line after conversion.
pub(crate) const PARAGRAPH_BREAK_MARKER: &str = "WXRPARAGRAPHBREAK";
/// Replaces a single `<br>`; becomes a Markdown hard break after conversion.
pub(crate) const LINE_BREAK_MARKER: &str = "WXRLINEBREAK";

/// Audio source attributes, most preferred first.
const AUDIO_SOURCES: &[&str] = &["m4a", "mp3", "src", "ogg", "wav"];

pub struct NormalizeContext<'a> {
    /// Title or link of the item being converted, used in log lines.
    pub item: &'a str,
    pub provider: &'a dyn ImageUrlProvider,
    pub settings: &'a ConvertSettings,
}

type Step = fn(&HtmlNormalizer, &str, &NormalizeContext<'_>) -> String;

const STEPS: &[(&str, Step)] = &[
    ("code blocks", HtmlNormalizer::code_blocks),
    ("captions", HtmlNormalizer::captions),
    ("galleries", HtmlNormalizer::galleries),
    ("audio", HtmlNormalizer::audio),
    ("parallax", HtmlNormalizer::parallax),
    ("line breaks", HtmlNormalizer::line_breaks),
];

/// Compiled patterns for every rewrite, built once and shared by all items.
pub struct HtmlNormalizer {
    attribute: Regex,
    tag: Regex,
    pre: Regex,
    code_inner: Regex,
    caption: Regex,
    img: Regex,
    wp_image: Regex,
    figcaption: Regex,
    gallery_shortcode: Regex,
    gallery_block: Regex,
    json_columns: Regex,
    json_ids: Regex,
    figure_directive: Regex,
    image_id: Regex,
    audio_shortcode: Regex,
    audio_block: Regex,
    audio_tag: Regex,
    awb: Regex,
    br_run: Regex,
    br: Regex,
}

impl Default for HtmlNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlNormalizer {
    pub fn new() -> Self {
        let re = |pattern: &str| Regex::new(pattern).expect("valid regex");
        Self {
            attribute: re(ATTRIBUTE_PATTERN),
            tag: re(r"(?s)<[^>]+>"),
            pre: re(r"(?is)<pre\b([^>]*)>(.*?)</pre>"),
            code_inner: re(r"(?is)^\s*<code\b([^>]*)>(.*?)</code>\s*$"),
            caption: re(r"(?is)\[caption\b[^\]]*\](.*?)\[/caption\]"),
            img: re(r"(?is)<img\b[^>]*>"),
            wp_image: re(r"(?s)<!-- wp:image\b.*?-->(.*?)<!-- /wp:image -->"),
            figcaption: re(r"(?is)<figcaption\b[^>]*>(.*?)</figcaption>"),
            gallery_shortcode: re(r"(?i)\[gallery\b([^\]]*)\]"),
            gallery_block: re(r"(?s)<!-- wp:gallery\b(.*?)-->(.*?)<!-- /wp:gallery -->"),
            json_columns: re(r#""columns"\s*:\s*(\d+)"#),
            json_ids: re(r#""ids"\s*:\s*\[([^\]]*)\]"#),
            figure_directive: re(r"(?s)\{\{< figure .*?>\}\}"),
            image_id: re(r#"wp-image-(\d+)|data-id="(\d+)""#),
            audio_shortcode: re(r"(?i)\[audio\b([^\]]*)\](?:\s*\[/audio\])?"),
            audio_block: re(r"(?s)<!-- wp:audio\b.*?-->(.*?)<!-- /wp:audio -->"),
            audio_tag: re(r"(?is)<(?:audio|source)\b([^>]*)>"),
            awb: re(r"(?s)\[nk_awb\b([^\]]*)\](.*?)\[/nk_awb\]"),
            br_run: re(r"(?i)(?:<br\s*/?>\s*){2,}"),
            br: re(r"(?i)<br\s*/?>"),
        }
    }

    /// Run every step in order.
    pub fn normalize(&self, html: &str, ctx: &NormalizeContext<'_>) -> String {
        STEPS.iter().fold(html.to_string(), |acc, (name, step)| {
            let out = step(self, &acc, ctx);
            if out != acc {
                wxr_trace!("{}: normalizer step {:?} rewrote the body", ctx.item, name);
            }
            out
        })
    }

    /// Canonicalize legacy highlighter markup into `<pre><code class="lang">`.
    pub fn code_blocks(&self, html: &str, _ctx: &NormalizeContext<'_>) -> String {
        self.pre
            .replace_all(html, |caps: &Captures| {
                let pre_attrs = Attributes::parse(&self.attribute, &caps[1]);
                let inner = &caps[2];
                if let Some(lang) = pre_attrs.non_empty("data-enlighter-language") {
                    return canonical_code(&map_language(lang), inner);
                }
                if let Some(token) = pre_attrs
                    .get("class")
                    .and_then(|class| class.split_whitespace().find(|t| t.starts_with("lang:")))
                {
                    return canonical_code(&map_language(token), inner);
                }
                if let Some(code) = self.code_inner.captures(inner) {
                    let code_attrs = Attributes::parse(&self.attribute, &code[1]);
                    let lang = code_attrs.get("class").map(language_from_class).unwrap_or_default();
                    return canonical_code(&lang, &code[2]);
                }
                caps[0].to_string()
            })
            .into_owned()
    }

    /// `[caption]` shortcodes and `wp:image` blocks become figure directives.
    pub fn captions(&self, html: &str, _ctx: &NormalizeContext<'_>) -> String {
        let html = self.caption.replace_all(html, |caps: &Captures| {
            let inner = &caps[1];
            let caption = self.strip_tags(inner);
            self.figure(inner, &caption)
                .unwrap_or_else(|| caps[0].to_string())
        });
        self.wp_image
            .replace_all(&html, |caps: &Captures| {
                let inner = &caps[1];
                let caption = self
                    .figcaption
                    .captures(inner)
                    .map(|c| self.strip_tags(&c[1]))
                    .unwrap_or_default();
                self.figure(inner, &caption)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// `[gallery]` shortcodes and `wp:gallery` blocks become a gallery
    /// directive with one figure per image. Unknown image ids are skipped.
    pub fn galleries(&self, html: &str, ctx: &NormalizeContext<'_>) -> String {
        let html = self.gallery_shortcode.replace_all(html, |caps: &Captures| {
            let attrs = Attributes::parse(&self.attribute, &caps[1]);
            let columns = attrs
                .non_empty("columns")
                .and_then(|c| c.parse().ok())
                .unwrap_or(ctx.settings.default_gallery_columns);
            let ids: Vec<&str> = attrs
                .get("ids")
                .map(|ids| ids.split(',').map(str::trim).filter(|id| !id.is_empty()).collect())
                .unwrap_or_default();
            gallery(&self.resolve_figures(&ids, ctx), columns, ctx)
        });
        self.gallery_block
            .replace_all(&html, |caps: &Captures| {
                let header = &caps[1];
                let inner = &caps[2];
                let columns = self
                    .json_columns
                    .captures(header)
                    .and_then(|c| c[1].parse().ok())
                    .unwrap_or(ctx.settings.default_gallery_columns);
                let figures = if let Some(ids) = self.json_ids.captures(header) {
                    let ids: Vec<&str> = ids
                        .get(1)
                        .map_or("", |m| m.as_str())
                        .split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .collect();
                    self.resolve_figures(&ids, ctx)
                } else if self.figure_directive.is_match(inner) {
                    self.figure_directive
                        .find_iter(inner)
                        .map(|m| m.as_str().to_string())
                        .collect()
                } else {
                    let mut ids: Vec<&str> = Vec::new();
                    for c in self.image_id.captures_iter(inner) {
                        if let Some(id) = c.get(1).or_else(|| c.get(2)).map(|m| m.as_str()) {
                            if !ids.contains(&id) {
                                ids.push(id);
                            }
                        }
                    }
                    self.resolve_figures(&ids, ctx)
                };
                gallery(&figures, columns, ctx)
            })
            .into_owned()
    }

    /// `[audio]` shortcodes and `wp:audio` blocks become an audio directive.
    pub fn audio(&self, html: &str, ctx: &NormalizeContext<'_>) -> String {
        let html = self.audio_shortcode.replace_all(html, |caps: &Captures| {
            let attrs = Attributes::parse(&self.attribute, &caps[1]);
            match AUDIO_SOURCES.iter().find_map(|key| attrs.non_empty(key)) {
                Some(src) => audio_directive(src),
                None => {
                    wxr_warn!("{}: audio shortcode without a source: {}", ctx.item, &caps[0]);
                    caps[0].to_string()
                }
            }
        });
        self.audio_block
            .replace_all(&html, |caps: &Captures| {
                let sources: Vec<String> = self
                    .audio_tag
                    .captures_iter(&caps[1])
                    .filter_map(|tag| {
                        Attributes::parse(&self.attribute, &tag[1])
                            .non_empty("src")
                            .map(str::to_string)
                    })
                    .collect();
                match sources.first() {
                    Some(src) => audio_directive(src),
                    None => {
                        wxr_warn!("{}: audio block without a source", ctx.item);
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Advanced WordPress Backgrounds image sections become a parallax
    /// directive around their content. Unresolvable images keep only the
    /// content.
    pub fn parallax(&self, html: &str, ctx: &NormalizeContext<'_>) -> String {
        self.awb
            .replace_all(html, |caps: &Captures| {
                let attrs = Attributes::parse(&self.attribute, &caps[1]);
                let inner = &caps[2];
                if attrs.get("awb_type") != Some("image") {
                    wxr_debug!("{}: dropping non-image background wrapper", ctx.item);
                    return inner.to_string();
                }
                let id = attrs.non_empty("awb_image").unwrap_or_default();
                match ctx.provider.image_info(id) {
                    Ok(info) => format!(
                        "{}{}{}",
                        Directive::new("parallaxblur")
                            .quoted("src", escape_src(&info.url))
                            .render(),
                        inner,
                        Directive::closing("parallaxblur")
                    ),
                    Err(err) => {
                        wxr_warn!("{}: dropping parallax background: {}", ctx.item, err);
                        inner.to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Protect `<br>` semantics from the generic converter, which would fold
    /// consecutive breaks into one.
    pub fn line_breaks(&self, html: &str, _ctx: &NormalizeContext<'_>) -> String {
        let html = self.br_run.replace_all(html, PARAGRAPH_BREAK_MARKER);
        self.br.replace_all(&html, LINE_BREAK_MARKER).into_owned()
    }

    fn figure(&self, inner: &str, caption: &str) -> Option<String> {
        let img = self.img.find(inner)?;
        let attrs = Attributes::parse(&self.attribute, img.as_str());
        let src = attrs.non_empty("src")?;
        let alt = unify_quotes(attrs.get("alt").unwrap_or_default().trim());
        Some(
            Directive::new("figure")
                .quoted("src", escape_src(src))
                .quoted_opt("alt", &alt)
                .quoted_opt("caption", &unify_quotes(caption))
                .render(),
        )
    }

    fn resolve_figures(&self, ids: &[&str], ctx: &NormalizeContext<'_>) -> Vec<String> {
        ids.iter()
            .filter_map(|id| match ctx.provider.image_info(id) {
                Ok(info) => Some(
                    Directive::new("figure")
                        .quoted("src", escape_src(&info.url))
                        .quoted_opt("alt", &unify_quotes(&info.title))
                        .render(),
                ),
                Err(err) => {
                    wxr_warn!("{}: skipping gallery image: {}", ctx.item, err);
                    None
                }
            })
            .collect()
    }

    fn strip_tags(&self, html: &str) -> String {
        self.tag.replace_all(html, "").trim().to_string()
    }
}

fn gallery(figures: &[String], columns: u32, ctx: &NormalizeContext<'_>) -> String {
    if figures.is_empty() {
        wxr_warn!("{}: dropping gallery without resolvable images", ctx.item);
        return String::new();
    }
    format!(
        "{}\n{}\n{}",
        Directive::new("gallery").quoted("cols", columns.to_string()).render(),
        figures.join("\n"),
        Directive::closing("gallery")
    )
}

fn audio_directive(src: &str) -> String {
    Directive::new("audio").quoted("src", escape_src(src)).render()
}

fn canonical_code(lang: &str, code: &str) -> String {
    if lang.is_empty() {
        format!("<pre><code>{code}</code></pre>")
    } else {
        format!("<pre><code class=\"{lang}\">{code}</code></pre>")
    }
}

fn language_from_class(class: &str) -> String {
    let first = class.split_whitespace().next();
    class
        .split_whitespace()
        .find(|t| t.starts_with("language-") || t.starts_with("lang:"))
        .or(first)
        .map(map_language)
        .unwrap_or_default()
}

/// Strip highlighter prefixes and fold aliases onto one name per language.
pub(crate) fn map_language(raw: &str) -> String {
    let lower = raw.trim().to_ascii_lowercase();
    let name = lower
        .strip_prefix("lang:")
        .or_else(|| lower.strip_prefix("language-"))
        .unwrap_or(&lower);
    match name {
        "golang" => "go",
        "shell" | "sh" => "bash",
        "raw" | "generic" => "",
        other => other,
    }
    .to_string()
}
