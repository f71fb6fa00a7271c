//! Stateless queries over a loaded corpus.
//!
//! Every function preserves the order of its input and borrows from it; the
//! caller decides whether to pass the full corpus or an already filtered view.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::domain::entities::Post;
use crate::domain::types::PostStatus;

/// Which part of a post satisfied a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Excerpt,
    Tag,
    Body,
}

/// Corpus ordering: newest first, lower ID first on equal dates.
pub fn corpus_order(a: &Post, b: &Post) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id))
}

pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(corpus_order);
}

pub fn published_only<'a, I>(posts: I) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts
        .into_iter()
        .filter(|post| post.is_published())
        .collect()
}

pub fn by_tag<'a, I>(posts: I, tag: &str) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts.into_iter().filter(|post| post.has_tag(tag)).collect()
}

/// Case-insensitive substring search over title, excerpt, tags and body text.
pub fn search<'a, I>(posts: I, query: &str) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    let needle = query.to_lowercase();
    posts
        .into_iter()
        .filter(|post| match_field(post, &needle).is_some())
        .collect()
}

/// First field of `post` containing `needle`, checked in priority order.
///
/// `needle` must already be lowercased.
pub fn match_field(post: &Post, needle: &str) -> Option<SearchField> {
    if post.title.to_lowercase().contains(needle) {
        return Some(SearchField::Title);
    }
    if post.excerpt.to_lowercase().contains(needle) {
        return Some(SearchField::Excerpt);
    }
    if post
        .tags
        .iter()
        .any(|tag| tag.to_lowercase().contains(needle))
    {
        return Some(SearchField::Tag);
    }
    if strip_markup(&post.body_html)
        .to_lowercase()
        .contains(needle)
    {
        return Some(SearchField::Body);
    }
    None
}

/// Posts sharing at least one tag with `target`, in input order, excluding
/// `target` itself. Stops after `limit` matches.
pub fn related<'a, I>(posts: I, target: &Post, limit: usize) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut matches = Vec::with_capacity(limit);
    for post in posts {
        if post.id == target.id {
            continue;
        }
        if target.shares_tag_with(post) {
            matches.push(post);
            if matches.len() >= limit {
                break;
            }
        }
    }
    matches
}

/// Deduplicated, lexicographically sorted tags.
pub fn all_tags<'a, I>(posts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts
        .into_iter()
        .flat_map(|post| post.tags.iter().map(String::as_str))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

pub fn latest<'a, I>(posts: I, limit: usize) -> Vec<&'a Post>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts.into_iter().take(limit).collect()
}

/// Drop every `<...>` span from `html`. Line breaks become spaces.
///
/// This does not validate markup: an unterminated `<` swallows the rest of
/// the input.
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match (in_tag, ch) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                if is_line_break(&tag) {
                    text.push(' ');
                }
            }
            (true, _) => tag.push(ch),
            (false, _) => text.push(ch),
        }
    }

    text
}

fn is_line_break(tag: &str) -> bool {
    let name = tag.trim().trim_end_matches('/').trim_end();
    name.eq_ignore_ascii_case("br")
}
