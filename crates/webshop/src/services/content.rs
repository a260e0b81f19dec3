//! Markdown rendering for admin-edited content blocks.

use comrak::{Options, markdown_to_html};
use sqlx::PgPool;

use crate::db::{ContentRepository, RepositoryError};

/// Render markdown to HTML with GitHub Flavored Markdown support.
///
/// Raw HTML is passed through; only admins can edit content.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());

    options.render.r#unsafe = true;

    markdown_to_html(content, &options)
}

/// The rendered HTML of a content block, empty when it does not exist.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn rendered(pool: &PgPool, name: &str) -> Result<String, RepositoryError> {
    let block = ContentRepository::new(pool).get(name).await?;
    Ok(block.map_or_else(String::new, |b| render_markdown(&b.markdown)))
}
