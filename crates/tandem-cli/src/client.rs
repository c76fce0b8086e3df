use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::aggregate::Snapshot;
use crate::drafts::{AlbumDraft, CommentDraft, PostDraft, PostEdit};
use crate::errors::ClientError;
use crate::models::{Account, Album, Comment, ContentKind, LongPost, Photo, ShortPost};

/// Read side of the journal service.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch_short_posts(&self) -> Result<Vec<ShortPost>, ClientError>;
    async fn fetch_long_posts(&self) -> Result<Vec<LongPost>, ClientError>;
    async fn fetch_albums(&self) -> Result<Vec<Album>, ClientError>;
}

/// Fetches the three collections concurrently. Fails as a whole if any
/// of them fails, so callers never see a partial snapshot.
pub async fn fetch_all<S>(store: &S) -> Result<Snapshot, ClientError>
where
    S: ContentStore + ?Sized,
{
    let (thoughts, articles, albums) = tokio::try_join!(
        store.fetch_short_posts(),
        store.fetch_long_posts(),
        store.fetch_albums()
    )?;
    Ok(Snapshot::new(thoughts, articles, albums))
}

#[derive(Debug, Deserialize)]
struct PostRecord {
    id: i64,
    author: Account,
    #[serde(default)]
    title: String,
    content: String,
    date: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    comments: Vec<Comment>,
}

impl From<PostRecord> for ShortPost {
    fn from(record: PostRecord) -> Self {
        ShortPost {
            id: record.id,
            author: record.author,
            date: record.date,
            content: record.content,
            comments: record.comments,
        }
    }
}

impl From<PostRecord> for LongPost {
    fn from(record: PostRecord) -> Self {
        LongPost {
            id: record.id,
            author: record.author,
            date: record.date,
            updated_at: record.updated_at.unwrap_or(record.date),
            title: record.title,
            content: record.content,
            comments: record.comments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AlbumRecord {
    id: i64,
    author: Account,
    description: Option<String>,
    date: DateTime<Utc>,
    #[serde(default)]
    photos: Vec<Photo>,
    #[serde(default)]
    comments: Vec<Comment>,
}

impl From<AlbumRecord> for Album {
    fn from(record: AlbumRecord) -> Self {
        Album {
            id: record.id,
            author: record.author,
            description: record.description.filter(|d| !d.trim().is_empty()),
            date: record.date,
            photos: record.photos,
            comments: record.comments,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePostBody<'a> {
    #[serde(rename = "type")]
    kind: ContentKind,
    author: Account,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdatePostBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AddCommentBody<'a> {
    post_id: i64,
    post_type: ContentKind,
    author: Account,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateAlbumBody<'a> {
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct UpdatedResponse {
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// The journal service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpContentStore {
    client: Client,
    base: Url,
}

impl HttpContentStore {
    pub fn new(service_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), service_url)
    }

    pub fn with_client(client: Client, service_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(service_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    /// Where the service serves a stored photo.
    pub fn photo_url(&self, filename: &str) -> Result<Url, ClientError> {
        self.endpoint(&format!("uploads/{filename}"))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = check(self.client.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    #[instrument(skip_all, fields(kind = %draft.kind(), author = %draft.author()))]
    pub async fn create_post(&self, draft: &PostDraft) -> Result<i64, ClientError> {
        let body = CreatePostBody {
            kind: draft.kind(),
            author: draft.author(),
            title: draft.title(),
            content: draft.content(),
        };
        let response = self
            .client
            .post(self.endpoint("api/posts")?)
            .json(&body)
            .send()
            .await?;
        let record: PostRecord = check(response).await?.json().await?;
        Ok(record.id)
    }

    /// Replaces a post's title and content, returning the new edit time.
    #[instrument(skip_all, fields(id = id))]
    pub async fn update_post(&self, id: i64, edit: &PostEdit) -> Result<DateTime<Utc>, ClientError> {
        let body = UpdatePostBody {
            title: edit.title(),
            content: edit.content(),
        };
        let response = self
            .client
            .put(self.endpoint(&format!("api/posts/{id}"))?)
            .json(&body)
            .send()
            .await?;
        let updated: UpdatedResponse = check(response).await?.json().await?;
        Ok(updated.updated_at)
    }

    #[instrument(skip_all, fields(id = id))]
    pub async fn delete_post(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("api/posts/{id}"))?)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(post_id = draft.post_id(), post_type = %draft.kind()))]
    pub async fn add_comment(&self, draft: &CommentDraft) -> Result<Comment, ClientError> {
        let body = AddCommentBody {
            post_id: draft.post_id(),
            post_type: draft.kind(),
            author: draft.author(),
            content: draft.content(),
        };
        let response = self
            .client
            .post(self.endpoint("api/comments")?)
            .json(&body)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    #[instrument(skip_all, fields(author = %draft.author(), photos = draft.photos().len()))]
    pub async fn create_album(&self, draft: &AlbumDraft) -> Result<Album, ClientError> {
        let mut form = Form::new().text("author", draft.author().as_str().to_string());
        if let Some(description) = draft.description() {
            form = form.text("description", description.to_string());
        }
        for photo in draft.photos() {
            let part = Part::bytes(photo.bytes.clone()).file_name(photo.file_name.clone());
            form = form.part("photos", part);
        }

        let response = self
            .client
            .post(self.endpoint("api/albums")?)
            .multipart(form)
            .send()
            .await?;
        let record: AlbumRecord = check(response).await?.json().await?;
        Ok(record.into())
    }

    #[instrument(skip_all, fields(id = id))]
    pub async fn update_album(&self, id: i64, description: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .put(self.endpoint(&format!("api/albums/{id}"))?)
            .json(&UpdateAlbumBody { description })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(id = id))]
    pub async fn delete_album(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("api/albums/{id}"))?)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for HttpContentStore {
    async fn fetch_short_posts(&self) -> Result<Vec<ShortPost>, ClientError> {
        let records: Vec<PostRecord> = self.get_json("api/posts/thoughts").await?;
        Ok(records.into_iter().map(ShortPost::from).collect())
    }

    async fn fetch_long_posts(&self) -> Result<Vec<LongPost>, ClientError> {
        let records: Vec<PostRecord> = self.get_json("api/posts/articles").await?;
        Ok(records.into_iter().map(LongPost::from).collect())
    }

    async fn fetch_albums(&self) -> Result<Vec<Album>, ClientError> {
        let records: Vec<AlbumRecord> = self.get_json("api/albums").await?;
        Ok(records.into_iter().map(Album::from).collect())
    }
}

/// Turns a non-success response into [`ClientError::Status`], using the
/// service's `{"error": ...}` message when there is one.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&text)
        .map(|parsed| parsed.error)
        .unwrap_or(text);
    warn!(%status, error = %body, "Service rejected request");
    Err(ClientError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::*;
    use crate::testing::InMemoryStore;

    fn populated_store() -> InMemoryStore {
        let day = at(2024, 3, 1, 0, 0);
        InMemoryStore::new(Snapshot::new(
            vec![thought(1, Account::Male, day, "t")],
            vec![article(2, Account::Female, day, "a", "b")],
            vec![album(1, Account::Female, day, Some("d"))],
        ))
    }

    #[tokio::test]
    async fn test_fetch_all_returns_every_collection() {
        let snapshot = fetch_all(&populated_store()).await.unwrap();
        assert_eq!(snapshot.len(), 3);
    }

    #[tokio::test]
    async fn test_one_failing_collection_fails_fetch_all() {
        for kind in ContentKind::ALL {
            let store = populated_store();
            store.set_failing(kind, true);
            assert!(
                matches!(fetch_all(&store).await, Err(ClientError::InvalidInput(_))),
                "a failing {kind} fetch must fail the whole snapshot"
            );
        }
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let store = HttpContentStore::new("http://example.test/journal").unwrap();
        assert_eq!(
            store.endpoint("api/albums").unwrap().as_str(),
            "http://example.test/journal/api/albums"
        );

        let store = HttpContentStore::new("http://example.test").unwrap();
        assert_eq!(
            store.photo_url("1-2.jpg").unwrap().as_str(),
            "http://example.test/uploads/1-2.jpg"
        );
    }

    #[test]
    fn test_rejects_unparseable_url() {
        assert!(matches!(
            HttpContentStore::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_post_record_conversions() {
        let json = r#"{
            "id": 4, "type": "articles", "author": "female", "title": "T",
            "content": "body", "date": "2024-03-01T10:00:00Z",
            "updated_at": null, "comments": []
        }"#;
        let record: PostRecord = serde_json::from_str(json).unwrap();
        let post = LongPost::from(record);
        assert_eq!(post.updated_at, post.date);
        assert_eq!(post.author, Account::Female);
    }

    #[test]
    fn test_blank_album_description_becomes_none() {
        let json = r#"{
            "id": 1, "author": "male", "description": "  ",
            "date": "2024-03-01T10:00:00Z",
            "photos": [{"id": 1, "album_id": 1, "filename": "1-1.jpg"}]
        }"#;
        let album = Album::from(serde_json::from_str::<AlbumRecord>(json).unwrap());
        assert_eq!(album.description, None);
        assert_eq!(album.photos.len(), 1);
        assert!(album.comments.is_empty());
    }
}
