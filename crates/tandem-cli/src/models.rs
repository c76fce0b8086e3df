use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two accounts sharing the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Account {
    Male,
    Female,
}

impl Account {
    pub const ALL: [Account; 2] = [Account::Male, Account::Female];

    /// The counterpart account. Applying it twice gives back `self`.
    pub fn other(self) -> Account {
        match self {
            Account::Male => Account::Female,
            Account::Female => Account::Male,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Account::Male => "male",
            Account::Female => "female",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Account::Male => "♂",
            Account::Female => "♀",
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Account {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Account::Male),
            "female" => Ok(Account::Female),
            other => Err(format!("unknown account '{other}', expected male or female")),
        }
    }
}

/// Content type discriminant, also sent as `post_type` on comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Thoughts,
    Articles,
    Gallery,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [
        ContentKind::Thoughts,
        ContentKind::Articles,
        ContentKind::Gallery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Thoughts => "thoughts",
            ContentKind::Articles => "articles",
            ContentKind::Gallery => "gallery",
        }
    }

    /// Human-readable type label.
    pub fn label(self) -> &'static str {
        match self {
            ContentKind::Thoughts => "Thought",
            ContentKind::Articles => "Article",
            ContentKind::Gallery => "Album",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thoughts" | "thought" => Ok(ContentKind::Thoughts),
            "articles" | "article" => Ok(ContentKind::Articles),
            "gallery" | "album" | "albums" => Ok(ContentKind::Gallery),
            other => Err(format!(
                "unknown content type '{other}', expected thoughts, articles or gallery"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author: Account,
    pub content: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub id: i64,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShortPost {
    pub id: i64,
    pub author: Account,
    pub date: DateTime<Utc>,
    pub content: String,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LongPost {
    pub id: i64,
    pub author: Account,
    pub date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    pub id: i64,
    pub author: Account,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub photos: Vec<Photo>,
    pub comments: Vec<Comment>,
}

/// Any of the three kinds of journal entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    ShortPost(ShortPost),
    LongPost(LongPost),
    Album(Album),
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentItem::ShortPost(_) => ContentKind::Thoughts,
            ContentItem::LongPost(_) => ContentKind::Articles,
            ContentItem::Album(_) => ContentKind::Gallery,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ContentItem::ShortPost(p) => p.id,
            ContentItem::LongPost(p) => p.id,
            ContentItem::Album(a) => a.id,
        }
    }

    pub fn author(&self) -> Account {
        match self {
            ContentItem::ShortPost(p) => p.author,
            ContentItem::LongPost(p) => p.author,
            ContentItem::Album(a) => a.author,
        }
    }

    pub fn date(&self) -> DateTime<Utc> {
        match self {
            ContentItem::ShortPost(p) => p.date,
            ContentItem::LongPost(p) => p.date,
            ContentItem::Album(a) => a.date,
        }
    }

    pub fn comments(&self) -> &[Comment] {
        match self {
            ContentItem::ShortPost(p) => &p.comments,
            ContentItem::LongPost(p) => &p.comments,
            ContentItem::Album(a) => &a.comments,
        }
    }

    /// The text shown for the item in lists: the article title, the post
    /// body, or the album description.
    pub fn headline(&self) -> &str {
        match self {
            ContentItem::ShortPost(p) => &p.content,
            ContentItem::LongPost(p) => &p.title,
            ContentItem::Album(a) => a.description.as_deref().unwrap_or("posted a new album"),
        }
    }
}

impl From<ShortPost> for ContentItem {
    fn from(post: ShortPost) -> Self {
        ContentItem::ShortPost(post)
    }
}

impl From<LongPost> for ContentItem {
    fn from(post: LongPost) -> Self {
        ContentItem::LongPost(post)
    }
}

impl From<Album> for ContentItem {
    fn from(album: Album) -> Self {
        ContentItem::Album(album)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_account_is_an_involution() {
        for account in Account::ALL {
            assert_ne!(account.other(), account);
            assert_eq!(account.other().other(), account);
        }
    }

    #[test]
    fn test_parse_kind_aliases() {
        assert_eq!("Article".parse::<ContentKind>(), Ok(ContentKind::Articles));
        assert_eq!("album".parse::<ContentKind>(), Ok(ContentKind::Gallery));
        assert!("recipes".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Account::Female).unwrap(), "\"female\"");
        assert_eq!(
            serde_json::from_str::<ContentKind>("\"gallery\"").unwrap(),
            ContentKind::Gallery
        );
    }
}
