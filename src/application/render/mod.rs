//! Markdown to sanitised HTML.
//!
//! Rendering is pure: the same markdown always produces the same HTML, and
//! nothing here touches the filesystem or shared state.

mod config;

use std::sync::Arc;

use once_cell::sync::Lazy;

use config::{build_post_sanitizer, default_options};

/// Average reading speed used for read-time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Comrak-based renderer with Ammonia sanitisation.
pub struct MarkdownRenderer {
    options: comrak::Options<'static>,
    sanitizer: ammonia::Builder<'static>,
}

impl MarkdownRenderer {
    fn new() -> Self {
        Self {
            options: default_options(),
            sanitizer: build_post_sanitizer(),
        }
    }

    /// Render CommonMark with GFM extensions, then strip anything unsafe.
    pub fn render(&self, markdown: &str) -> String {
        let html = comrak::markdown_to_html(markdown, &self.options);
        self.sanitizer.clean(&html).to_string()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

static RENDERER: Lazy<Arc<MarkdownRenderer>> = Lazy::new(|| Arc::new(MarkdownRenderer::new()));

/// Access the shared renderer, initialised on first use.
pub fn renderer() -> Arc<MarkdownRenderer> {
    Arc::clone(&RENDERER)
}

/// Minutes needed to read `markdown`, rounded up. Empty input reads in zero.
pub fn read_time_minutes(markdown: &str) -> u32 {
    let words = markdown.split_whitespace().count();
    u32::try_from(words.div_ceil(WORDS_PER_MINUTE)).unwrap_or(u32::MAX)
}
