//! Shared domain enumerations.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub const VARIANTS: &'static [&'static str] = &["draft", "published", "archived"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    /// Resolve the effective status of a post from its frontmatter.
    ///
    /// Precedence: an explicit `status` wins; otherwise `published: false`
    /// marks the post as a draft; when neither is present the post is
    /// published.
    pub fn derive(explicit: Option<PostStatus>, published: Option<bool>) -> PostStatus {
        match (explicit, published) {
            (Some(status), _) => status,
            (None, Some(false)) => PostStatus::Draft,
            (None, Some(true) | None) => PostStatus::Published,
        }
    }
}

impl Display for PostStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = ();

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => Err(()),
        }
    }
}

impl<'de> Deserialize<'de> for PostStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value
            .parse()
            .map_err(|()| D::Error::unknown_variant(value.trim(), Self::VARIANTS))
    }
}

/// Channel a post was shared through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareChannel {
    Facebook,
    Twitter,
    LinkedIn,
    Other,
}

impl ShareChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::LinkedIn => "linkedin",
            Self::Other => "other",
        }
    }
}

impl From<&str> for ShareChannel {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "facebook" => Self::Facebook,
            "twitter" | "x" => Self::Twitter,
            "linkedin" => Self::LinkedIn,
            _ => Self::Other,
        }
    }
}
