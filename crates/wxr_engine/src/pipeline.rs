use wxr_logging::wxr_warn;
use wxr_model::{Footnote, ImageUrlProvider};

use crate::convert::{ConvertError, Converter, Html2MdConverter};
use crate::normalize::{HtmlNormalizer, NormalizeContext};
use crate::postprocess::{MarkdownPostProcessor, PostContext, Processed};
use crate::settings::ConvertSettings;

/// Per-item inputs to [`MarkdownPipeline::run`].
pub struct ItemBody<'a> {
    /// Title or link, used in log lines.
    pub item: &'a str,
    pub html: &'a str,
    pub footnotes: &'a [Footnote],
}

/// HTML normalizer, generic converter and Markdown post-processor, built once
/// and shared by every item of a run.
pub struct MarkdownPipeline {
    normalizer: HtmlNormalizer,
    converter: Box<dyn Converter>,
    post: MarkdownPostProcessor,
    settings: ConvertSettings,
}

impl MarkdownPipeline {
    pub fn new(settings: ConvertSettings) -> Self {
        let converter = Html2MdConverter::wordpress(&settings);
        Self::with_converter(settings, Box::new(converter))
    }

    pub fn with_converter(settings: ConvertSettings, converter: Box<dyn Converter>) -> Self {
        Self {
            normalizer: HtmlNormalizer::new(),
            converter,
            post: MarkdownPostProcessor::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ConvertSettings {
        &self.settings
    }

    pub fn post_processor(&self) -> &MarkdownPostProcessor {
        &self.post
    }

    pub fn run(
        &self,
        body: &ItemBody<'_>,
        provider: &dyn ImageUrlProvider,
        site_host: Option<&str>,
    ) -> Result<Processed, ConvertError> {
        if body.html.trim().is_empty() {
            wxr_warn!("{}: empty HTML body", body.item);
            return Ok(Processed {
                markdown: String::new(),
                summary: None,
            });
        }
        let normalized = self.normalizer.normalize(
            body.html,
            &NormalizeContext {
                item: body.item,
                provider,
                settings: &self.settings,
            },
        );
        let markdown = self.converter.to_markdown(&normalized)?;
        let footnotes = self.footnotes_as_markdown(body);
        Ok(self.post.process(
            &markdown,
            &PostContext {
                item: body.item,
                site_host,
                footnotes: &footnotes,
                settings: &self.settings,
            },
        ))
    }

    /// Footnote contents are stored as HTML. One that fails to convert is
    /// kept as is.
    fn footnotes_as_markdown(&self, body: &ItemBody<'_>) -> Vec<Footnote> {
        body.footnotes
            .iter()
            .map(|footnote| {
                let content = match self.converter.to_markdown(&footnote.content) {
                    Ok(markdown) => markdown.trim().to_string(),
                    Err(err) => {
                        wxr_warn!("{}: footnote {:?} kept as HTML: {}", body.item, footnote.id, err);
                        footnote.content.clone()
                    }
                };
                Footnote {
                    id: footnote.id.clone(),
                    content,
                }
            })
            .collect()
    }
}
