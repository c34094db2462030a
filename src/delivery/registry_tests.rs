//! Tests for `RetryRegistry`.

use super::RetryRegistry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn bump(count: &Arc<AtomicUsize>) -> impl std::future::Future<Output = ()> + Send + 'static {
    let count = Arc::clone(count);
    async move {
        count.fetch_add(1, Ordering::SeqCst);
    }
}

mod schedule {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runs_task_after_delay() {
        let registry = Arc::new(RetryRegistry::new());
        let count = counter();

        assert!(registry.schedule("w1", Duration::from_secs(2), bump(&count)));

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(registry.pending("w1"), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(registry.pending("w1"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tracks_pending_per_webhook() {
        let registry = Arc::new(RetryRegistry::new());
        let count = counter();

        registry.schedule("w1", Duration::from_secs(1), bump(&count));
        registry.schedule("w1", Duration::from_secs(5), bump(&count));
        registry.schedule("w2", Duration::from_secs(1), bump(&count));

        assert_eq!(registry.pending("w1"), 2);
        assert_eq!(registry.pending("w2"), 1);
        assert_eq!(registry.pending_total(), 3);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(registry.pending("w1"), 1);
        assert_eq!(registry.pending("w2"), 0);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refused_after_close() {
        let registry = Arc::new(RetryRegistry::new());
        let count = counter();

        registry.close();

        assert!(registry.is_closed());
        assert!(!registry.schedule("w1", Duration::ZERO, bump(&count)));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}

mod cancel {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancel_webhook_only_affects_that_webhook() {
        let registry = Arc::new(RetryRegistry::new());
        let w1 = counter();
        let w2 = counter();

        registry.schedule("w1", Duration::from_secs(1), bump(&w1));
        registry.schedule("w1", Duration::from_secs(2), bump(&w1));
        registry.schedule("w2", Duration::from_secs(1), bump(&w2));

        assert_eq!(registry.cancel_webhook("w1"), 2);
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(w1.load(Ordering::SeqCst), 0);
        assert_eq!(w2.load(Ordering::SeqCst), 1);
        assert!(!registry.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_unknown_webhook_is_noop() {
        let registry = RetryRegistry::new();
        assert_eq!(registry.cancel_webhook("missing"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_everything() {
        let registry = Arc::new(RetryRegistry::new());
        let count = counter();

        registry.schedule("w1", Duration::from_secs(1), bump(&count));
        registry.schedule("w2", Duration::from_secs(1), bump(&count));

        assert_eq!(registry.close(), 2);
        assert_eq!(registry.pending_total(), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn started_task_is_not_cut_short() {
        let registry = Arc::new(RetryRegistry::new());
        let count = counter();
        let inner = Arc::clone(&count);

        registry.schedule("w1", Duration::from_secs(1), async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            inner.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(registry.cancel_webhook("w1"), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
