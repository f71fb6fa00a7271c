//! Application services over the parsed post corpus.

pub mod dashboard;
pub mod error;
pub mod frontmatter;
pub mod post_metrics;
pub mod posts;
pub mod render;
pub mod repos;
pub mod sessions;
