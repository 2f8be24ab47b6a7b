//! Markdown document assembly.
//!
//! A post is plain text: a front matter block, the banner image, then the
//! three generated body sections separated by blank lines.

use stackpost_shared::{OutputConfig, Post};

/// Remove double quotes so the title can sit inside a quoted YAML scalar.
pub fn strip_quotes(title: &str) -> String {
    title.replace('"', "")
}

/// Render tags as a YAML flow sequence: `['javascript', 'node.js']`.
pub fn format_tags(tags: &[String]) -> String {
    let quoted: Vec<String> = tags
        .iter()
        .map(|t| format!("'{}'", t.replace('\'', "''")))
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Build the front matter block (keys in fixed order: layout, title, tags).
pub fn build_front_matter(layout: &str, title: &str, tags: &[String]) -> String {
    let mut fm = String::from("---\n");
    fm.push_str(&format!("layout: {layout}\n"));
    fm.push_str(&format!("title: \"{}\"\n", strip_quotes(title)));
    fm.push_str(&format!("tags: {}\n", format_tags(tags)));
    fm.push_str("---\n");
    fm
}

/// Assemble the full post document.
///
/// Order is fixed: front matter, banner image, common errors, error body,
/// recommended sites.
pub fn assemble(output: &OutputConfig, tags: &[String], post: &Post) -> String {
    let front_matter = build_front_matter(&output.layout, &post.title.text, tags);

    let body = [
        output.banner_image.as_str(),
        post.common_errors.text.as_str(),
        post.error_body.text.as_str(),
        post.recommended_sites.text.as_str(),
    ]
    .join("\n\n");

    format!("{front_matter}\n{body}\n")
}
