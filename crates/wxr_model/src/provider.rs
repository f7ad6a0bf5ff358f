use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no image with id {id}")]
pub struct ImageNotFound {
    pub id: String,
}

/// Resolves WordPress attachment ids to image URLs. Lookups are read-only so
/// one provider can serve every item of a run.
pub trait ImageUrlProvider: Send + Sync {
    fn image_info(&self, id: &str) -> Result<ImageInfo, ImageNotFound>;
}

/// In-memory provider, handy for tests and for callers that already have a
/// lookup table.
#[derive(Debug, Clone, Default)]
pub struct StaticImageProvider {
    images: HashMap<String, ImageInfo>,
}

impl StaticImageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, id: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        self.insert(id, url, title);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, url: impl Into<String>, title: impl Into<String>) {
        self.images.insert(
            id.into(),
            ImageInfo {
                url: url.into(),
                title: title.into(),
            },
        );
    }
}

impl ImageUrlProvider for StaticImageProvider {
    fn image_info(&self, id: &str) -> Result<ImageInfo, ImageNotFound> {
        self.images
            .get(id.trim())
            .cloned()
            .ok_or_else(|| ImageNotFound { id: id.to_string() })
    }
}
