//! Turns one source document into a [`Post`].
//!
//! A document is a `---` line, a YAML metadata block, another `---` line and
//! a markdown body. Everything after the second delimiter line belongs to the
//! body, including further `---` lines.

use std::borrow::Cow;

use thiserror::Error;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};
use tracing::debug;

use crate::application::render::{read_time_minutes, renderer};
use crate::domain::entities::{FrontMatter, Post};
use crate::domain::slug::resolve_slug;
use crate::domain::types::PostStatus;

pub const DELIMITER: &str = "---";

const BOM: char = '\u{feff}';

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("document must open with a `---` metadata block closed by another `---` line")]
    MissingDelimiter,
    #[error("metadata block could not be decoded: {0}")]
    Metadata(#[from] serde_yaml::Error),
}

/// What the source knows about a document besides its bytes.
#[derive(Debug, Clone, Copy)]
pub struct SourceContext<'a> {
    pub file_stem: &'a str,
    pub modified: Option<OffsetDateTime>,
}

/// Parse and render `raw` into a post carrying `id`.
pub fn parse(raw: &[u8], id: u32, context: SourceContext<'_>) -> Result<Post, ParseError> {
    let text = std::str::from_utf8(raw)?;
    let text = normalize(text);
    let (metadata, body) = split_document(&text)?;
    // An empty block or an explicit YAML null both mean "no metadata".
    let front: FrontMatter = if metadata.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str::<Option<FrontMatter>>(metadata)?.unwrap_or_default()
    };

    let now = OffsetDateTime::now_utc();
    let date = front
        .date
        .as_deref()
        .and_then(parse_date)
        .unwrap_or_else(|| {
            debug!(
                file = context.file_stem,
                date = front.date.as_deref().unwrap_or_default(),
                "missing or malformed date, using current time"
            );
            now
        });

    let status = front.status();
    let title = front.title.clone().unwrap_or_default();
    let slug = resolve_slug(front.slug.as_deref(), &title, context.file_stem);

    Ok(Post {
        id,
        slug,
        title,
        author: front.author.unwrap_or_default(),
        body_html: renderer().render(body),
        excerpt: front.excerpt.unwrap_or_default(),
        tags: front.tags.unwrap_or_default(),
        category: front.category.filter(|category| !category.trim().is_empty()),
        featured: front.featured.unwrap_or(false),
        status,
        read_time_minutes: read_time_minutes(body),
        date,
        updated_at: context.modified.unwrap_or(now),
        published_at: (status == PostStatus::Published).then_some(date),
    })
}

fn normalize(text: &str) -> Cow<'_, str> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    if text.contains("\r\n") {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Split `text` into its metadata block and body.
///
/// Only blank lines may precede the opening delimiter. A delimiter line may
/// carry trailing whitespace but no indentation.
pub fn split_document(text: &str) -> Result<(&str, &str), ParseError> {
    let mut offset = 0;
    let mut opening: Option<usize> = None;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let is_delimiter = line.trim_end() == DELIMITER;

        match opening {
            None if is_delimiter => opening = Some(offset),
            None if line.trim().is_empty() => {}
            None => return Err(ParseError::MissingDelimiter),
            Some(metadata_start) if is_delimiter => {
                return Ok((&text[metadata_start..start], &text[offset..]));
            }
            Some(_) => {}
        }
    }

    Err(ParseError::MissingDelimiter)
}

/// `YYYY-MM-DD` at midnight UTC.
pub fn parse_date(value: &str) -> Option<OffsetDateTime> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(value.trim(), format)
        .ok()
        .map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn context(stem: &str) -> SourceContext<'_> {
        SourceContext {
            file_stem: stem,
            modified: Some(datetime!(2024-05-01 12:00 UTC)),
        }
    }

    const FULL: &str = "---
title: Hello World
author: Ada
date: 2024-01-15
tags: [rust, Web, rust]
excerpt: A first post
slug: hello
status: published
category: notes
featured: true
---
# Heading

Some **bold** words here.
";

    #[test]
    fn parses_every_metadata_field() {
        let post = parse(FULL.as_bytes(), 7, context("2024-01-hello")).expect("valid post");

        assert_eq!(post.id, 7);
        assert_eq!(post.title, "Hello World");
        assert_eq!(post.author, "Ada");
        assert_eq!(post.slug, "hello");
        assert_eq!(post.excerpt, "A first post");
        assert_eq!(post.tags, vec!["rust", "Web", "rust"]);
        assert_eq!(post.category.as_deref(), Some("notes"));
        assert!(post.featured);
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.date, datetime!(2024-01-15 0:00 UTC));
        assert_eq!(post.published_at, Some(post.date));
        assert_eq!(post.updated_at, datetime!(2024-05-01 12:00 UTC));
        assert_eq!(post.read_time_minutes, 1);
        assert!(post.body_html.contains("<h1>Heading</h1>"));
        assert!(post.body_html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn crlf_and_bom_are_accepted() {
        let raw = "\u{feff}---\r\ntitle: Windows\r\n---\r\nbody\r\n";
        let post = parse(raw.as_bytes(), 1, context("win")).expect("valid post");

        assert_eq!(post.title, "Windows");
        assert_eq!(post.body_html.trim(), "<p>body</p>");
    }

    #[test]
    fn later_delimiters_stay_in_body() {
        let (metadata, body) =
            split_document("---\ntitle: a\n---\nfirst\n---\nsecond\n").expect("split");

        assert_eq!(metadata, "title: a\n");
        assert_eq!(body, "first\n---\nsecond\n");
    }

    #[test]
    fn missing_delimiters_are_rejected() {
        assert!(matches!(
            split_document("no metadata here"),
            Err(ParseError::MissingDelimiter)
        ));
        assert!(matches!(
            split_document("---\ntitle: never closed\n"),
            Err(ParseError::MissingDelimiter)
        ));
        assert!(matches!(
            split_document("preamble\n---\ntitle: a\n---\nbody"),
            Err(ParseError::MissingDelimiter)
        ));
    }

    #[test]
    fn blank_lines_may_precede_the_metadata() {
        let (metadata, body) = split_document("\n  \n---\ntitle: a\n---  \nbody").expect("split");
        assert_eq!(metadata, "title: a\n");
        assert_eq!(body, "body");
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let raw = b"---\ntitle: \xff\n---\nbody";
        assert!(matches!(
            parse(raw, 1, context("bad")),
            Err(ParseError::Encoding(_))
        ));
    }

    #[test]
    fn malformed_metadata_is_rejected() {
        let raw = "---\ntitle: [unclosed\n---\nbody";
        assert!(matches!(
            parse(raw.as_bytes(), 1, context("bad")),
            Err(ParseError::Metadata(_))
        ));

        let unknown_status = "---\nstatus: scheduled\n---\nbody";
        assert!(matches!(
            parse(unknown_status.as_bytes(), 1, context("bad")),
            Err(ParseError::Metadata(_))
        ));
    }

    #[test]
    fn status_is_case_insensitive() {
        let post = parse(b"---\ntitle: A\nstatus: Published\n---\nbody", 1, context("a"))
            .expect("valid post");
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.published_at, Some(post.date));

        let draft = parse(b"---\ntitle: B\nstatus: ' Draft '\n---\nbody", 2, context("b"))
            .expect("valid post");
        assert_eq!(draft.status, PostStatus::Draft);
    }

    #[test]
    fn null_metadata_is_treated_as_empty() {
        let post = parse(b"---\n~\n---\nbody", 1, context("bare")).expect("valid post");
        assert_eq!(post.title, "");
        assert_eq!(post.slug, "bare");
        assert_eq!(post.status, PostStatus::Published);
    }

    #[test]
    fn bad_date_falls_back_to_now() {
        let before = OffsetDateTime::now_utc();
        let raw = "---\ntitle: Undated\ndate: 15/01/2024\n---\nbody";
        let post = parse(raw.as_bytes(), 1, context("undated")).expect("valid post");

        assert!(post.date >= before);
    }

    #[test]
    fn published_flag_drives_status_when_status_absent() {
        let draft = parse(
            b"---\ntitle: Draft\npublished: false\n---\nbody",
            1,
            context("draft"),
        )
        .expect("valid post");
        assert_eq!(draft.status, PostStatus::Draft);
        assert_eq!(draft.published_at, None);

        let explicit = parse(
            b"---\nstatus: archived\npublished: true\n---\nbody",
            2,
            context("old"),
        )
        .expect("valid post");
        assert_eq!(explicit.status, PostStatus::Archived);
        assert_eq!(explicit.published_at, None);
    }

    #[test]
    fn slug_falls_back_to_title_then_stem() {
        let from_title = parse(b"---\ntitle: Hello There\n---\n", 1, context("file"))
            .expect("valid post");
        assert_eq!(from_title.slug, "hello-there");

        let from_stem = parse(b"---\nauthor: Ada\n---\n", 1, context("2024-notes"))
            .expect("valid post");
        assert_eq!(from_stem.slug, "2024-notes");
        assert_eq!(from_stem.title, "");
    }

    #[test]
    fn parse_date_uses_midnight_utc() {
        assert_eq!(parse_date("2024-03-01"), Some(datetime!(2024-03-01 0:00 UTC)));
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date(""), None);
    }
}
