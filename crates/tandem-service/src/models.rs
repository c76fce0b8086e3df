use crate::validation::{ValidationError, require_text};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminant shared by posts, albums and the `post_type` column of comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Thoughts,
    Articles,
    Gallery,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Thoughts => "thoughts",
            ContentKind::Articles => "articles",
            ContentKind::Gallery => "gallery",
        }
    }

    /// Thoughts and articles live in the `posts` table, albums do not.
    pub fn is_post(&self) -> bool {
        !matches!(self, ContentKind::Gallery)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thoughts" => Ok(ContentKind::Thoughts),
            "articles" => Ok(ContentKind::Articles),
            "gallery" => Ok(ContentKind::Gallery),
            other => Err(ValidationError::UnknownContentType(other.to_string())),
        }
    }
}

/// The two accounts that share the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Male,
    Female,
}

impl Author {
    pub fn as_str(&self) -> &'static str {
        match self {
            Author::Male => "male",
            Author::Female => "female",
        }
    }
}

impl FromStr for Author {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "male" => Ok(Author::Male),
            "female" => Ok(Author::Female),
            "" => Err(ValidationError::MissingField("author")),
            other => Err(ValidationError::UnknownAuthor(other.to_string())),
        }
    }
}

/// Current instant as stored in the database: UTC, microsecond precision.
pub fn now_timestamp() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Post {
    pub id: i32,
    pub kind: String,
    pub author: String,
    pub title: String,
    pub content: String,
    pub date: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::posts)]
pub struct NewPost {
    pub kind: String,
    pub author: String,
    pub title: String,
    pub content: String,
    pub date: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewPost {
    pub fn new(
        kind: &str,
        author: &str,
        title: Option<String>,
        content: String,
    ) -> Result<Self, ValidationError> {
        let kind = ContentKind::from_str(kind)?;
        if !kind.is_post() {
            return Err(ValidationError::UnknownContentType(kind.to_string()));
        }
        let author = Author::from_str(author)?;
        let content = require_text(content, "content")?;
        let title = match kind {
            ContentKind::Articles => require_text(title.unwrap_or_default(), "title")?,
            _ => String::new(),
        };

        let date = now_timestamp();
        Ok(NewPost {
            kind: kind.as_str().to_string(),
            author: author.as_str().to_string(),
            title,
            content,
            date,
            updated_at: date,
        })
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::posts)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub updated_at: NaiveDateTime,
}

impl PostChanges {
    /// Builds the edit for `existing`. Articles keep requiring a title, and
    /// `updated_at` never falls at or before the creation instant.
    pub fn new(
        existing: &Post,
        title: Option<String>,
        content: String,
    ) -> Result<Self, ValidationError> {
        let content = require_text(content, "content")?;
        let title = if existing.kind == ContentKind::Articles.as_str() {
            require_text(title.unwrap_or_default(), "title")?
        } else {
            String::new()
        };

        let mut updated_at = now_timestamp();
        if updated_at <= existing.date {
            updated_at = existing.date + chrono::Duration::microseconds(1);
        }

        Ok(PostChanges {
            title,
            content,
            updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub post_type: String,
    pub author: String,
    pub content: String,
    pub date: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::comments)]
pub struct NewComment {
    pub post_id: i32,
    pub post_type: String,
    pub author: String,
    pub content: String,
    pub date: NaiveDateTime,
}

impl NewComment {
    pub fn new(
        post_id: i32,
        post_type: &str,
        author: &str,
        content: String,
    ) -> Result<Self, ValidationError> {
        let post_type = ContentKind::from_str(post_type)?;
        let author = Author::from_str(author)?;
        let content = require_text(content, "content")?;

        Ok(NewComment {
            post_id,
            post_type: post_type.as_str().to_string(),
            author: author.as_str().to_string(),
            content,
            date: now_timestamp(),
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::albums)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Album {
    pub id: i32,
    pub author: String,
    pub description: Option<String>,
    pub date: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::albums)]
pub struct NewAlbum {
    pub author: String,
    pub description: Option<String>,
    pub date: NaiveDateTime,
}

impl NewAlbum {
    pub fn new(author: &str, description: Option<String>) -> Result<Self, ValidationError> {
        let author = Author::from_str(author)?;

        Ok(NewAlbum {
            author: author.as_str().to_string(),
            description: normalize_description(description),
            date: now_timestamp(),
        })
    }
}

/// Blank descriptions are stored as absent so they never match a search.
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(Album))]
#[diesel(table_name = crate::schema::photos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Photo {
    pub id: i32,
    pub album_id: i32,
    pub filename: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::photos)]
pub struct NewPhoto<'a> {
    pub album_id: i32,
    pub filename: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_article_requires_title() {
        let err = NewPost::new("articles", "male", Some("  ".to_string()), "body".to_string())
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingField("title")));
    }

    #[test]
    fn test_new_thought_drops_title_and_trims_content() {
        let post = NewPost::new(
            "thoughts",
            "female",
            Some("ignored".to_string()),
            "  hello  ".to_string(),
        )
        .unwrap();
        assert_eq!(post.title, "");
        assert_eq!(post.content, "hello");
        assert_eq!(post.date, post.updated_at);
    }

    #[test]
    fn test_posts_cannot_be_gallery() {
        let err = NewPost::new("gallery", "male", None, "body".to_string()).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownContentType(_)));
    }

    #[test]
    fn test_unknown_author_rejected() {
        let err = NewComment::new(1, "thoughts", "someone", "hi".to_string()).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownAuthor(_)));
    }

    #[test]
    fn test_edit_timestamp_is_after_creation() {
        let existing = Post {
            id: 1,
            kind: "articles".to_string(),
            author: "male".to_string(),
            title: "A".to_string(),
            content: "B".to_string(),
            date: now_timestamp() + chrono::Duration::seconds(60),
            updated_at: now_timestamp(),
        };

        let changes = PostChanges::new(&existing, Some("A".to_string()), "C".to_string()).unwrap();
        assert!(changes.updated_at > existing.date);
    }

    #[test]
    fn test_blank_description_is_absent() {
        assert_eq!(normalize_description(Some("   ".to_string())), None);
        assert_eq!(
            normalize_description(Some(" beach ".to_string())),
            Some("beach".to_string())
        );
    }
}
