//! Semantic search as a transient view.
//!
//! Search hits are never merged into a surface's collection: they carry a
//! per-query `similarity` and their order is the service's relevance order.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::{GalleryError, Result};
use crate::record::ImageRecord;
use crate::store::ImageStore;

/// Hits for one query, in the order the service ranked them.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<ImageRecord>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Runs searches and remembers recent distinct queries.
pub struct SearchSession {
    store: Arc<dyn ImageStore>,
    history: VecDeque<String>,
    capacity: usize,
}

impl SearchSession {
    pub fn new(store: Arc<dyn ImageStore>, capacity: usize) -> Self {
        Self {
            store,
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Search for `query`. A blank query is rejected before any request.
    #[instrument(level = "debug", skip(self))]
    pub async fn search(&mut self, query: &str) -> Result<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GalleryError::EmptyQuery);
        }

        let hits = self.store.search(query).await?;
        debug!(count = hits.len(), "Search returned hits");
        self.remember(query);

        Ok(SearchResults {
            query: query.to_string(),
            hits,
        })
    }

    /// Re-run the history entry at `index` (0 is the most recent).
    ///
    /// Returns `Ok(None)` without a request when there is no such entry.
    pub async fn rerun(&mut self, index: usize) -> Result<Option<SearchResults>> {
        let Some(query) = self.history.get(index).cloned() else {
            return Ok(None);
        };
        self.search(&query).await.map(Some)
    }

    /// Recent distinct queries, most recent first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    fn remember(&mut self, query: &str) {
        if self.capacity == 0 || self.history.iter().any(|q| q == query) {
            return;
        }
        self.history.push_front(query.to_string());
        self.history.truncate(self.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;
    use crate::store::MockImageStore;

    fn hit(id: &str, similarity: f64) -> ImageRecord {
        let mut r = record(id, 0, "an evening sky");
        r.similarity = Some(similarity);
        r
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_request() {
        let store = Arc::new(MockImageStore::new());
        let mut session = SearchSession::new(store.clone(), 5);

        assert!(matches!(session.search("   ").await, Err(GalleryError::EmptyQuery)));
        assert_eq!(store.search_calls(), 0);
        assert_eq!(session.history().count(), 0);
    }

    #[tokio::test]
    async fn test_service_order_preserved() {
        let store = Arc::new(MockImageStore::new());
        store.set_search_results(vec![hit("b", 0.81), hit("a", 0.92)]);
        let mut session = SearchSession::new(store, 5);

        let results = session.search("sunset").await.unwrap();
        let ids: Vec<&str> = results.hits.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_distinct() {
        let store = Arc::new(MockImageStore::new());
        let mut session = SearchSession::new(store, 3);

        for q in ["cats", "dogs", "cats", "boats", "trees"] {
            session.search(q).await.unwrap();
        }
        let history: Vec<&str> = session.history().collect();
        assert_eq!(history, vec!["trees", "boats", "dogs"]);

        let rerun = session.rerun(1).await.unwrap().unwrap();
        assert_eq!(rerun.query, "boats");
    }

    #[tokio::test]
    async fn test_rerun_out_of_range_makes_no_request() {
        let store = Arc::new(MockImageStore::new());
        let mut session = SearchSession::new(store.clone(), 5);
        session.search("cats").await.unwrap();

        assert!(session.rerun(3).await.unwrap().is_none());
        assert_eq!(store.search_calls(), 1);
    }
}
