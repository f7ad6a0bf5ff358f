use crate::page::Page;

/// `---`-fenced YAML metadata, a blank line, then the Markdown body.
pub fn render_document(page: &Page) -> Result<String, serde_yaml::Error> {
    let frontmatter = serde_yaml::to_string(page.metadata())?;
    let body = page.markdown();
    let doc = if body.is_empty() {
        format!("---\n{frontmatter}---\n")
    } else {
        format!("---\n{frontmatter}---\n\n{body}\n")
    };
    Ok(doc)
}
