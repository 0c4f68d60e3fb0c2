//! In-memory thread store.
//!
//! One store is constructed at startup and shared by handle with the router;
//! tests build their own. Each call locks once and touches a single thread, so
//! every mutation is atomic on its own.

use std::collections::HashMap;

use tokio::sync::RwLock;

use smartpick_core::thread::{Thread, ThreadItem, ThreadView};

#[derive(Debug)]
struct Entry {
    /// Insertion order, used to break `created_at` ties.
    seq: u64,
    thread: Thread,
}

#[derive(Debug, Default)]
struct Inner {
    threads: HashMap<String, Entry>,
    next_seq: u64,
}

/// Process-lifetime mapping from thread id to thread.
#[derive(Debug, Default)]
pub struct ThreadStore {
    inner: RwLock<Inner>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<Thread> {
        self.inner
            .read()
            .await
            .threads
            .get(id)
            .map(|e| e.thread.clone())
    }

    /// Items of a thread in creation order; empty when the thread is unknown.
    pub async fn items(&self, id: &str) -> Vec<ThreadItem> {
        self.inner
            .read()
            .await
            .threads
            .get(id)
            .map(|e| e.thread.items.clone())
            .unwrap_or_default()
    }

    /// Append `items` to thread `id`, creating it first if absent.
    ///
    /// `created_at` and `title_if_absent` only apply when the thread is
    /// created. Items are appended in call order, never reordered or deduplicated.
    pub async fn upsert_append(
        &self,
        id: &str,
        created_at: &str,
        title_if_absent: Option<String>,
        items: Vec<ThreadItem>,
    ) -> Thread {
        debug_assert!(items.iter().all(|item| item.thread_id() == id));

        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;

        let entry = inner.threads.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!(thread_id = %id, "Thread created");
            let mut thread = Thread::new(id, created_at);
            thread.title = title_if_absent;
            Entry { seq, thread }
        });
        let created = entry.seq == seq;
        entry.thread.items.extend(items);
        let thread = entry.thread.clone();

        if created {
            inner.next_seq += 1;
        }
        thread
    }

    /// Thread summaries, newest first. Equal timestamps list the later insertion first.
    pub async fn list(&self) -> Vec<ThreadView> {
        let inner = self.inner.read().await;
        let mut entries: Vec<&Entry> = inner.threads.values().collect();
        entries.sort_by(|a, b| {
            b.thread
                .created_at
                .cmp(&a.thread.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        entries.into_iter().map(|e| e.thread.summary()).collect()
    }

    /// Replace the title. `None` when the thread is unknown.
    pub async fn set_title(&self, id: &str, title: Option<String>) -> Option<Thread> {
        let mut inner = self.inner.write().await;
        let entry = inner.threads.get_mut(id)?;
        entry.thread.title = title;
        Some(entry.thread.clone())
    }

    /// Remove a thread. Removing an unknown id is a no-op.
    pub async fn delete(&self, id: &str) {
        if self.inner.write().await.threads.remove(id).is_some() {
            tracing::debug!(thread_id = %id, "Thread deleted");
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.threads.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
