//! Shared types, error model, and configuration for stackpost.
//!
//! This crate is the foundation depended on by all other stackpost crates.
//! It provides:
//! - [`StackpostError`] and the per-stage errors [`QuestionError`], [`CompletionError`]
//! - Domain types ([`Topic`], [`SectionKind`], [`GeneratedSection`], [`Post`])
//! - Configuration ([`AppConfig`] and its sections, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CompletionConfig, OutputConfig, QuestionsConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_key, resolve_questions_key,
    validate_config,
};
pub use error::{CompletionError, QuestionError, Result, StackpostError};
pub use types::{GeneratedSection, Post, SectionKind, Stage, Topic};
