#[derive(Debug, Clone)]
pub struct ConvertSettings {
    /// Bodies with at least this many headings get a table of contents.
    pub toc_min_headings: usize,
    pub default_map_width: u32,
    pub default_map_height: u32,
    pub default_gallery_columns: u32,
    pub default_catlist_count: i64,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            toc_min_headings: 3,
            default_map_width: 640,
            default_map_height: 480,
            default_gallery_columns: 1,
            default_catlist_count: 10,
        }
    }
}
