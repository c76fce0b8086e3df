pub mod aggregate;
pub mod checkpoint;
pub mod client;
pub mod config;
pub mod drafts;
pub mod errors;
pub mod models;
pub mod notifications;
pub mod pagination;
pub mod render;
pub mod search;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::Snapshot;
pub use client::{ContentStore, HttpContentStore, fetch_all};
pub use errors::ClientError;
pub use models::{Account, ContentItem, ContentKind};
