//! Core pipeline orchestration for stackpost.
//!
//! This crate ties together question selection, section generation,
//! document assembly, and the post file write into one run (`generate_post`).

pub mod document;
pub mod pipeline;
pub mod writer;
