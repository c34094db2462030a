//! Tests for `SubscriptionIndex` and the refresher.

use super::{SubscriptionIndex, refresh_once, spawn_refresher};
use crate::delivery::RetryRegistry;
use crate::model::WebhookDefinition;
use crate::store::MemoryConfigStore;
use std::sync::Arc;
use std::time::Duration;

fn hook(id: &str, events: &[&str]) -> WebhookDefinition {
    WebhookDefinition::outbound(id, url::Url::parse("https://example.com/hook").unwrap())
        .with_events(events.iter().copied())
}

fn ids(index: &SubscriptionIndex, event: &str) -> Vec<String> {
    let mut ids: Vec<_> = index.lookup(event).iter().map(|d| d.id.clone()).collect();
    ids.sort();
    ids
}

mod rebuild {
    use super::*;

    #[test]
    fn empty_index_has_no_routes() {
        let index = SubscriptionIndex::new();

        assert!(index.lookup("orders.afterCreate").is_empty());
        assert_eq!(index.snapshot().event_count(), 0);
    }

    #[test]
    fn routes_each_event_to_its_subscribers() {
        let index = SubscriptionIndex::new();
        index.rebuild(&[
            hook("a", &["orders.afterCreate", "orders.afterUpdate"]),
            hook("b", &["orders.afterCreate"]),
        ]);

        assert_eq!(ids(&index, "orders.afterCreate"), vec!["a", "b"]);
        assert_eq!(ids(&index, "orders.afterUpdate"), vec!["a"]);
        assert!(index.lookup("orders.afterDelete").is_empty());
        assert_eq!(index.snapshot().event_count(), 2);
    }

    #[test]
    fn skips_disabled_and_inbound_definitions() {
        let index = SubscriptionIndex::new();
        let mut inbound = WebhookDefinition::inbound("in");
        inbound.events.insert("orders.afterCreate".to_string());

        index.rebuild(&[
            hook("on", &["orders.afterCreate"]),
            hook("off", &["orders.afterCreate"]).with_enabled(false),
            inbound,
        ]);

        assert_eq!(ids(&index, "orders.afterCreate"), vec!["on"]);
        assert_eq!(index.snapshot().webhook_ids().len(), 1);
    }

    #[test]
    fn returns_previous_snapshot() {
        let index = SubscriptionIndex::new();
        index.rebuild(&[hook("a", &["x"])]);

        let previous = index.rebuild(&[hook("b", &["y"])]);

        assert!(previous.webhook_ids().contains("a"));
        assert!(index.snapshot().webhook_ids().contains("b"));
    }

    #[test]
    fn held_snapshot_survives_swap() {
        let index = SubscriptionIndex::new();
        index.rebuild(&[hook("a", &["x"])]);
        let held = index.snapshot();

        index.rebuild(&[]);

        assert_eq!(held.lookup("x").len(), 1);
        assert!(index.lookup("x").is_empty());
    }

    #[test]
    fn readers_never_see_partial_tables() {
        let index = Arc::new(SubscriptionIndex::new());
        let full: Vec<_> = (0..50).map(|i| hook(&format!("w{i}"), &["x"])).collect();

        let reader = {
            let index = Arc::clone(&index);
            std::thread::spawn(move || {
                for _ in 0..2000 {
                    let seen = index.lookup("x").len();
                    assert!(seen == 0 || seen == 50, "saw {seen} subscribers");
                }
            })
        };

        for i in 0..200 {
            if i % 2 == 0 {
                index.rebuild(&full);
            } else {
                index.rebuild(&[]);
            }
        }

        reader.join().unwrap();
    }
}

mod refresh {
    use super::*;

    #[test]
    fn refresh_once_reports_removed_webhooks() {
        let config = MemoryConfigStore::with_definitions([
            hook("a", &["x"]),
            hook("b", &["x", "y"]),
        ]);
        let index = SubscriptionIndex::new();

        let first = refresh_once(&config, &index);
        assert_eq!(first.webhooks, 2);
        assert_eq!(first.events, 2);
        assert!(first.removed.is_empty());

        config.set_enabled("a", false);
        let second = refresh_once(&config, &index);

        assert_eq!(second.webhooks, 1);
        assert_eq!(second.removed, vec!["a".to_string()]);
        assert_eq!(ids(&index, "x"), vec!["b"]);
    }

    #[tokio::test]
    async fn refresher_builds_before_returning() {
        let config = Arc::new(MemoryConfigStore::with_definitions([hook("a", &["x"])]));
        let index = Arc::new(SubscriptionIndex::new());

        let task = spawn_refresher(config, Arc::clone(&index), Arc::new(RetryRegistry::new()));

        assert_eq!(ids(&index, "x"), vec!["a"]);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn disable_then_enable_follows_config() {
        let config = Arc::new(MemoryConfigStore::with_definitions([hook("a", &["x"])]));
        let index = Arc::new(SubscriptionIndex::new());
        let task = spawn_refresher(
            Arc::clone(&config),
            Arc::clone(&index),
            Arc::new(RetryRegistry::new()),
        );

        config.set_enabled("a", false);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(index.lookup("x").is_empty());

        config.set_enabled("a", true);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(ids(&index, "x"), vec!["a"]);

        config.upsert(hook("c", &["x"]));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(ids(&index, "x"), vec!["a", "c"]);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn removal_cancels_pending_retries() {
        let config = Arc::new(MemoryConfigStore::with_definitions([
            hook("a", &["x"]),
            hook("b", &["x"]),
        ]));
        let index = Arc::new(SubscriptionIndex::new());
        let retries = Arc::new(RetryRegistry::new());
        let task = spawn_refresher(Arc::clone(&config), index, Arc::clone(&retries));

        retries.schedule("a", Duration::from_secs(60), async {});
        retries.schedule("b", Duration::from_secs(60), async {});

        config.remove("a");
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(retries.pending("a"), 0);
        assert_eq!(retries.pending("b"), 1);
        task.abort();
    }
}
