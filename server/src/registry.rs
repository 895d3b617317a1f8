//! Username to farm mapping.
//!
//! Entries are created on first reference and live for the rest of the
//! process; there is no logout or deletion.

use crate::engine::PlotEngine;
use crate::scheduler::GrowthScheduler;
use log::info;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

pub struct PlayerRegistry {
    players: RwLock<HashMap<String, Arc<PlotEngine>>>,
    scheduler: GrowthScheduler,
}

impl PlayerRegistry {
    pub fn new(scheduler: GrowthScheduler) -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
            scheduler,
        }
    }

    /// Returns the player's engine, creating it on first use.
    ///
    /// Creation happens through the map entry under the write lock, so two
    /// sessions racing on the same new username share one engine.
    pub fn get_or_create(&self, username: &str) -> Arc<PlotEngine> {
        if let Some(engine) = self.get(username) {
            return engine;
        }

        let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
        let engine = players.entry(username.to_string()).or_insert_with(|| {
            info!("Created farm for player {}", username);
            Arc::new(PlotEngine::new(self.scheduler.clone()))
        });
        Arc::clone(engine)
    }

    /// Looks a player up without creating anything.
    pub fn get(&self, username: &str) -> Option<Arc<PlotEngine>> {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::runtime::Handle;

    fn registry() -> PlayerRegistry {
        PlayerRegistry::new(GrowthScheduler::new(
            Handle::current(),
            4,
            Duration::from_secs(3600),
        ))
    }

    #[tokio::test]
    async fn test_get_does_not_create() {
        let registry = registry();
        assert!(registry.get("ghost").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let registry = registry();
        let first = registry.get_or_create("alice");
        first.add_coins(10);

        let second = registry.get_or_create("alice");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.coins(), 50);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let registry = registry();
        registry.get_or_create("bob");
        registry.get_or_create("Bob");
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_reference() {
        let registry = Arc::new(registry());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.get_or_create("carol") })
            })
            .collect();

        let mut engines = Vec::new();
        for handle in handles {
            engines.push(handle.await.unwrap());
        }

        assert_eq!(registry.len(), 1);
        assert!(engines.iter().all(|engine| Arc::ptr_eq(engine, &engines[0])));
    }
}
