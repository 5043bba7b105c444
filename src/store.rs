// src/store.rs
//! In-memory review cache and approval ledger.
//!
//! Approval state properly lives behind the external reviews API; this
//! store is the service's cached copy of it. Toggling applies an
//! optimistic echo: the flag flips here immediately and is re-applied to
//! every fresh snapshot fetched later.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::review::NormalizedReview;

#[derive(Debug, Default)]
pub struct ReviewStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    reviews: Vec<NormalizedReview>,
    approvals: HashMap<String, bool>,
}

impl ReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a fresh snapshot for one channel, re-applying every known
    /// approval. Reviews from other channels are untouched. Returns the
    /// merged per-channel slice (what the fetch endpoint responds with).
    pub fn replace_channel(
        &self,
        channel: &str,
        mut fresh: Vec<NormalizedReview>,
    ) -> Vec<NormalizedReview> {
        let mut inner = self.inner.write().expect("review store lock poisoned");
        for review in fresh.iter_mut() {
            if let Some(&approved) = inner.approvals.get(&review.id) {
                review.manager_approved = approved;
            }
        }
        inner.reviews.retain(|r| r.channel != channel);
        inner.reviews.extend(fresh.iter().cloned());
        fresh
    }

    /// Current cached copy, approvals already applied.
    pub fn snapshot(&self) -> Vec<NormalizedReview> {
        self.inner
            .read()
            .expect("review store lock poisoned")
            .reviews
            .clone()
    }

    /// Flip the moderation flag for `id` and return the new state.
    /// Unknown ids start from "not approved", matching the external
    /// API's id-keyed approval ledger.
    pub fn toggle_approval(&self, id: &str) -> bool {
        let mut inner = self.inner.write().expect("review store lock poisoned");
        let current = inner
            .approvals
            .get(id)
            .copied()
            .or_else(|| {
                inner
                    .reviews
                    .iter()
                    .find(|r| r.id == id)
                    .map(|r| r.manager_approved)
            })
            .unwrap_or(false);
        let next = !current;
        inner.approvals.insert(id.to_string(), next);
        if let Some(review) = inner.reviews.iter_mut().find(|r| r.id == id) {
            review.manager_approved = next;
        }
        next
    }

    pub fn approvals(&self) -> HashMap<String, bool> {
        self.inner
            .read()
            .expect("review store lock poisoned")
            .approvals
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("review store lock poisoned").reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
