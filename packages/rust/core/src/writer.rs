//! Post filename derivation and the final file write.

use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use tracing::{info, instrument};

use stackpost_shared::{Result, StackpostError};

use crate::document::strip_quotes;

/// Slug used when a title has no alphanumeric characters at all.
const FALLBACK_SLUG: &str = "untitled";

/// Generate a filesystem-safe slug from a title.
///
/// Lowercases, turns every run of non-alphanumeric characters (whitespace,
/// quotes, punctuation) into one hyphen, and trims hyphens from both ends.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// The calendar day before `today`.
pub fn yesterday(today: NaiveDate) -> NaiveDate {
    today - Days::new(1)
}

/// `{date}-{slug}.md`
pub fn post_filename(date: NaiveDate, title: &str) -> String {
    let slug = slugify(&strip_quotes(title));
    let slug = if slug.is_empty() { FALLBACK_SLUG } else { &slug };
    format!("{}-{slug}.md", date.format("%Y-%m-%d"))
}

/// Write `content` to `dir/filename`, replacing any existing file.
///
/// The directory must already exist.
#[instrument(skip(content), fields(bytes = content.len()))]
pub fn write_post(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(filename);
    std::fs::write(&path, content).map_err(|e| StackpostError::io(&path, e))?;
    info!(path = %path.display(), "post written");
    Ok(path)
}
