//! Core domain types shared across the stackpost pipeline.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The pipeline stage a run is in (used for progress and error reporting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Configure,
    SelectQuestion,
    Generate,
    Assemble,
    Write,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::SelectQuestion => "select question",
            Self::Generate => "generate",
            Self::Assemble => "assemble",
            Self::Write => "write",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SectionKind
// ---------------------------------------------------------------------------

/// The four pieces of generated content that make up a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Rewritten post title.
    Title,
    /// "Common errors" explanation.
    CommonErrors,
    /// Step-by-step fix.
    ErrorBody,
    /// Recommended reading links.
    RecommendedSites,
}

impl SectionKind {
    /// All sections, in the order they are generated.
    pub const ALL: [SectionKind; 4] = [
        Self::Title,
        Self::CommonErrors,
        Self::ErrorBody,
        Self::RecommendedSites,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::CommonErrors => "common errors",
            Self::ErrorBody => "error body",
            Self::RecommendedSites => "recommended sites",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

/// The question a post is written about. Immutable once selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Question title, HTML entities decoded.
    pub title: String,
    /// Question tags, in the order the API returned them.
    pub tags: Vec<String>,
    /// Link to the question on the Q&A site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Vote score at fetch time.
    #[serde(default)]
    pub score: i64,
}

// ---------------------------------------------------------------------------
// Generated content
// ---------------------------------------------------------------------------

/// Post-processed text for one section, with the tokens it cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSection {
    pub kind: SectionKind,
    pub text: String,
    /// `usage.total_tokens` reported by the completion API.
    pub total_tokens: u64,
}

/// Everything generated for one post, ready for assembly.
#[derive(Debug, Clone)]
pub struct Post {
    pub title: GeneratedSection,
    pub common_errors: GeneratedSection,
    pub error_body: GeneratedSection,
    pub recommended_sites: GeneratedSection,
}

impl Post {
    /// Sum of tokens used across all four completions.
    pub fn total_tokens(&self) -> u64 {
        self.title.total_tokens
            + self.common_errors.total_tokens
            + self.error_body.total_tokens
            + self.recommended_sites.total_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(kind: SectionKind, tokens: u64) -> GeneratedSection {
        GeneratedSection {
            kind,
            text: String::new(),
            total_tokens: tokens,
        }
    }

    #[test]
    fn post_total_tokens_sums_sections() {
        let post = Post {
            title: section(SectionKind::Title, 10),
            common_errors: section(SectionKind::CommonErrors, 1200),
            error_body: section(SectionKind::ErrorBody, 1800),
            recommended_sites: section(SectionKind::RecommendedSites, 90),
        };
        assert_eq!(post.total_tokens(), 3100);
    }

    #[test]
    fn section_kind_serializes_snake_case() {
        let json = serde_json::to_string(&SectionKind::RecommendedSites).expect("serialize");
        assert_eq!(json, "\"recommended_sites\"");
    }

    #[test]
    fn generation_order_is_fixed() {
        assert_eq!(SectionKind::ALL[0], SectionKind::Title);
        assert_eq!(SectionKind::ALL[3], SectionKind::RecommendedSites);
    }
}
