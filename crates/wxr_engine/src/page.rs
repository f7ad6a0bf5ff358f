//! Page assembly: front-matter metadata plus the converted Markdown body.
use chrono::{DateTime, FixedOffset};
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use url::Url;
use wxr_logging::{wxr_debug, wxr_warn};
use wxr_model::{CommonFields, Footnote, ImageUrlProvider};

use crate::convert::ConvertError;
use crate::pipeline::{ItemBody, MarkdownPipeline};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("featured image {id} of {title:?} not found")]
    FeaturedImage { id: String, title: String },
    #[error("converting {link}: {source}")]
    Convert {
        link: String,
        #[source]
        source: ConvertError,
    },
}

/// Everything the assembler needs from one content item.
#[derive(Debug, Clone)]
pub struct PageInput<'a> {
    pub link: &'a str,
    pub author: &'a str,
    pub title: &'a str,
    pub publish_date: Option<DateTime<FixedOffset>>,
    pub draft: bool,
    pub categories: &'a [String],
    pub tags: &'a [String],
    pub footnotes: &'a [Footnote],
    pub html: &'a str,
    pub guid: &'a str,
    pub featured_image_id: Option<&'a str>,
    pub post_format: Option<&'a str>,
}

impl<'a> PageInput<'a> {
    pub fn from_fields(fields: &'a CommonFields) -> Self {
        Self {
            link: &fields.link,
            author: &fields.author,
            title: &fields.title,
            publish_date: fields.publish_date,
            draft: fields.is_draft(),
            categories: &fields.categories,
            tags: &fields.tags,
            footnotes: &fields.footnotes,
            html: &fields.content,
            guid: &fields.guid,
            featured_image_id: fields.featured_image_id.as_deref(),
            post_format: fields.post_format.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    url: String,
    metadata: Mapping,
    markdown: String,
}

impl Page {
    pub fn new(
        pipeline: &MarkdownPipeline,
        provider: &dyn ImageUrlProvider,
        site_host: Option<&str>,
        input: &PageInput<'_>,
    ) -> Result<Self, PageError> {
        let mut metadata = Mapping::new();
        insert(&mut metadata, "url", relative_path(input.link));
        insert(&mut metadata, "author", input.author);
        insert(&mut metadata, "title", input.title);
        if let Some(date) = input.publish_date {
            insert(&mut metadata, "date", date.to_rfc3339());
        }
        insert(&mut metadata, "draft", input.draft);
        if let Some(list) = sorted_unique(input.categories) {
            insert(&mut metadata, "category", list);
        }
        if let Some(list) = sorted_unique(input.tags) {
            insert(&mut metadata, "tag", list);
        }
        insert(&mut metadata, "guid", input.guid);

        if let Some(id) = input.featured_image_id.filter(|id| !id.is_empty()) {
            let image = provider.image_info(id).map_err(|_| PageError::FeaturedImage {
                id: id.to_string(),
                title: input.title.to_string(),
            })?;
            let mut cover = Mapping::new();
            insert(&mut cover, "image", image.url);
            insert(&mut cover, "alt", image.title);
            insert(&mut metadata, "cover", cover);
        }
        if let Some(format) = input.post_format.filter(|f| !f.is_empty()) {
            insert(&mut metadata, "type", format);
        }

        let item = if input.title.is_empty() { input.link } else { input.title };
        let processed = pipeline
            .run(
                &ItemBody {
                    item,
                    html: input.html,
                    footnotes: input.footnotes,
                },
                provider,
                site_host,
            )
            .map_err(|source| PageError::Convert {
                link: input.link.to_string(),
                source,
            })?;

        if processed.markdown.is_empty() && !input.html.trim().is_empty() {
            wxr_warn!("{}: nothing left of the body after conversion", item);
        }
        let headings = pipeline.post_processor().heading_count(&processed.markdown);
        if headings >= pipeline.settings().toc_min_headings {
            wxr_debug!("{}: {} headings, enabling table of contents", item, headings);
            insert(&mut metadata, "ShowToc", true);
            insert(&mut metadata, "TocOpen", true);
        }
        if let Some(summary) = processed.summary {
            insert(&mut metadata, "summary", summary);
        }

        Ok(Self {
            url: input.link.to_string(),
            metadata,
            markdown: processed.markdown,
        })
    }

    /// Absolute source URL of the item.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn metadata(&self) -> &Mapping {
        &self.metadata
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }
}

fn insert(map: &mut Mapping, key: &str, value: impl Into<Value>) {
    map.insert(Value::from(key), value.into());
}

/// Path component of an absolute link; anything unparseable is kept as is.
fn relative_path(link: &str) -> String {
    match Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link.to_string(),
    }
}

fn sorted_unique(values: &[String]) -> Option<Vec<String>> {
    let mut list: Vec<String> = values
        .iter()
        .filter(|v| !v.is_empty())
        .cloned()
        .collect();
    list.sort();
    list.dedup();
    (!list.is_empty()).then_some(list)
}
