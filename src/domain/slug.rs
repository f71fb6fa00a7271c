//! Slug derivation for posts whose frontmatter omits one.
//!
//! ASCII text goes straight through `slug::slugify`; Chinese characters are
//! transliterated with `pinyin` first so “基线对齐” becomes `ji-xian-dui-qi`.

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a URL-safe slug from human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(transliterate_to_ascii(input));
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Pick the slug for a post: an explicit value, else one derived from the
/// title, else one derived from the source file stem.
pub fn resolve_slug(explicit: Option<&str>, title: &str, file_stem: &str) -> String {
    if let Some(slug) = explicit.map(str::trim).filter(|slug| !slug.is_empty()) {
        return slug.to_string();
    }

    derive_slug(title)
        .or_else(|_| derive_slug(file_stem))
        .unwrap_or_else(|_| file_stem.to_string())
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            None => output.push(ch),
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_transliterates_chinese() {
        let slug = derive_slug("Rust 基础教程").expect("slug");
        assert_eq!(slug, "rust-ji-chu-jiao-cheng");
    }

    #[test]
    fn derive_slug_rejects_blank_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn explicit_slug_is_kept_verbatim() {
        assert_eq!(
            resolve_slug(Some(" my-Custom_slug "), "Ignored", "file"),
            "my-Custom_slug"
        );
    }

    #[test]
    fn falls_back_to_title_then_file_stem() {
        assert_eq!(resolve_slug(None, "Hello, World!", "file"), "hello-world");
        assert_eq!(resolve_slug(Some(""), "", "2024-01-first"), "2024-01-first");
        assert_eq!(resolve_slug(None, "!!!", "notes"), "notes");
    }
}
