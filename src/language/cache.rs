// SPDX-License-Identifier: MIT
//! Process-wide language service cache.
//!
//! A service is expensive to build, so the cache guarantees at-most-one
//! construction per distinct configuration object even when many
//! connections race on first access: every racer lands on the same
//! `OnceCell` and the loser waits for the winner's instance. Keys are
//! configuration identity (`Arc` pointer), never structural equality;
//! the slot retains the config `Arc` so a key can't be recycled while
//! cached. Construction failures are not cached — a later call retries.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use super::registry::LanguageFactory;
use super::service::{LanguageConfig, LanguageService};

#[derive(Default)]
pub struct ServiceCache {
    slots: Mutex<HashMap<usize, CacheSlot>>,
}

struct CacheSlot {
    /// Keeps the keyed allocation alive for the cache's lifetime.
    _config: Arc<LanguageConfig>,
    cell: Arc<OnceCell<Arc<dyn LanguageService>>>,
}

impl ServiceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic get-or-insert: returns the cached instance for this exact
    /// configuration object, building it via `factory` on first access.
    pub async fn get_or_build(
        &self,
        factory: &LanguageFactory,
        config: &Arc<LanguageConfig>,
    ) -> anyhow::Result<Arc<dyn LanguageService>> {
        let cell = {
            let mut slots = self.slots.lock().await;
            let key = Arc::as_ptr(config) as usize;
            let slot = slots.entry(key).or_insert_with(|| {
                debug!(language = %config.language, key, "new service cache slot");
                CacheSlot {
                    _config: Arc::clone(config),
                    cell: Arc::new(OnceCell::new()),
                }
            });
            Arc::clone(&slot.cell)
        };

        let service = cell
            .get_or_try_init(|| async { factory(config) })
            .await?;
        Ok(Arc::clone(service))
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::text::TextLanguageService;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_factory(builds: Arc<AtomicUsize>) -> LanguageFactory {
        Arc::new(move |config: &LanguageConfig| {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(TextLanguageService::from_config(config)?) as Arc<dyn LanguageService>)
        })
    }

    #[tokio::test]
    async fn concurrent_first_access_builds_once() {
        let cache = Arc::new(ServiceCache::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let factory = counting_factory(Arc::clone(&builds));
        let config = Arc::new(LanguageConfig::new("text"));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let factory = factory.clone();
            let config = Arc::clone(&config);
            tasks.push(tokio::spawn(async move {
                cache.get_or_build(&factory, &config).await.unwrap()
            }));
        }

        let mut services = Vec::new();
        for task in tasks {
            services.push(task.await.unwrap());
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        let first = &services[0];
        for service in &services {
            assert!(Arc::ptr_eq(first, service));
        }
    }

    #[tokio::test]
    async fn identity_not_structural_equality() {
        let cache = ServiceCache::new();
        let builds = Arc::new(AtomicUsize::new(0));
        let factory = counting_factory(Arc::clone(&builds));

        // Structurally identical configs, distinct objects.
        let first = Arc::new(LanguageConfig::new("text"));
        let second = Arc::new(LanguageConfig::new("text"));

        let a = cache.get_or_build(&factory, &first).await.unwrap();
        let b = cache.get_or_build(&factory, &second).await.unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = ServiceCache::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_in_factory = Arc::clone(&attempts);
        let factory: LanguageFactory = Arc::new(move |config: &LanguageConfig| {
            if attempts_in_factory.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("backend unavailable");
            }
            Ok(Arc::new(TextLanguageService::from_config(config)?) as Arc<dyn LanguageService>)
        });
        let config = Arc::new(LanguageConfig::new("text"));

        assert!(cache.get_or_build(&factory, &config).await.is_err());
        let service = cache.get_or_build(&factory, &config).await.unwrap();
        assert_eq!(service.name(), "text");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
