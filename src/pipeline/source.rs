//! Mention source abstraction and the fixture-backed implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::common::error::{SourceError, SourceResult};
use crate::common::{Mention, MentionId};

/// Where mentions come from and where replies go.
#[async_trait]
pub trait MentionSource: Send + Sync {
    /// Current mentions addressed to the bot, in platform order.
    async fn fetch_mentions(&self) -> SourceResult<Vec<Mention>>;

    /// Post `text` as a reply to the given mention.
    async fn post_reply(&self, text: &str, in_reply_to: &MentionId) -> SourceResult<()>;

    /// Handle of the account the source is authenticated as.
    async fn authenticated_handle(&self) -> SourceResult<String>;
}

#[async_trait]
impl<S: MentionSource + ?Sized> MentionSource for Arc<S> {
    async fn fetch_mentions(&self) -> SourceResult<Vec<Mention>> {
        (**self).fetch_mentions().await
    }

    async fn post_reply(&self, text: &str, in_reply_to: &MentionId) -> SourceResult<()> {
        (**self).post_reply(text, in_reply_to).await
    }

    async fn authenticated_handle(&self) -> SourceResult<String> {
        (**self).authenticated_handle().await
    }
}

/// Replays recorded mentions from a JSON file.
///
/// The file is re-read on every fetch so it can be edited during a run.
/// Replies are only logged.
pub struct FixtureSource {
    path: PathBuf,
    handle: String,
}

impl FixtureSource {
    pub fn new(path: impl AsRef<Path>, handle: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            handle: handle.into(),
        }
    }

    fn fixture_error(&self, message: impl ToString) -> SourceError {
        SourceError::Fixtures {
            path: self.path.display().to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl MentionSource for FixtureSource {
    async fn fetch_mentions(&self) -> SourceResult<Vec<Mention>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.fixture_error(e))?;
        serde_json::from_str(&content).map_err(|e| self.fixture_error(e))
    }

    async fn post_reply(&self, text: &str, in_reply_to: &MentionId) -> SourceResult<()> {
        info!(mention_id = %in_reply_to, "<Fixture reply> {}", text);
        Ok(())
    }

    async fn authenticated_handle(&self) -> SourceResult<String> {
        Ok(self.handle.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fixture_source_reads_mentions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "2", "author": "alice", "text": "1234567?", "created_at": "2017-05-10T12:30:00Z"}},
                {{"id": "1", "author": "bob", "text": "hi", "created_at": "2017-05-10T11:00:00Z"}}
            ]"#
        )
        .unwrap();

        let source = FixtureSource::new(file.path(), "CharityRandom");
        let mentions = tokio_test::block_on(source.fetch_mentions()).unwrap();

        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].author, "alice");
        assert_eq!(mentions[1].id, MentionId::from("1"));
        assert_eq!(
            tokio_test::block_on(source.authenticated_handle()).unwrap(),
            "CharityRandom"
        );
    }

    #[test]
    fn test_fixture_source_bad_file() {
        let source = FixtureSource::new("/nonexistent/mentions.json", "CharityRandom");
        let result = tokio_test::block_on(source.fetch_mentions());
        assert!(matches!(result, Err(SourceError::Fixtures { .. })));
    }
}
