//! Parsed-template cache.

use std::sync::Arc;

use super::MessageTemplate;
use crate::cache::{BoundedCache, DEFAULT_CAPACITY};

/// Shares parsed templates between log calls using the same template text.
#[derive(Debug)]
pub struct TemplateCache {
    inner: BoundedCache<Arc<MessageTemplate>>,
}

impl TemplateCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BoundedCache::new(capacity),
        }
    }

    pub fn parse(&self, text: &str) -> Arc<MessageTemplate> {
        self.inner
            .get_or_insert_with(text, |t| Arc::new(MessageTemplate::parse(t)))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
