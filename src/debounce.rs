use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Timer-reset debouncer: every `push` cancels the pending commit and schedules
/// a new one, so only the value that survives `delay` of inactivity is
/// published on the watch channel.
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    tx: Arc<watch::Sender<T>>,
}

impl<T> Debouncer<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> (Self, watch::Receiver<T>) {
        let (tx, rx) = watch::channel(initial);
        let debouncer = Self {
            delay,
            pending: None,
            tx: Arc::new(tx),
        };
        (debouncer, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn push(&mut self, value: T) {
        self.cancel();
        let tx = Arc::clone(&self.tx);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tx.send_if_modified(|current| {
                if *current == value {
                    return false;
                }
                *current = value;
                true
            });
        }));
    }

    /// Drops any pending commit and sets the committed value without notifying.
    pub fn reset(&mut self, value: T) {
        self.cancel();
        self.tx.send_if_modified(|current| {
            *current = value;
            false
        });
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_pushes_commit_once_with_last_value() {
        let (mut debouncer, mut rx) = Debouncer::new(String::new(), SEARCH_DEBOUNCE);

        for text in ["b", "ba", "bat", "batm", "batman"] {
            debouncer.push(text.to_string());
            settle().await;
            tokio::time::advance(Duration::from_millis(100)).await;
            settle().await;
        }
        assert!(!rx.has_changed().unwrap());

        tokio::time::advance(Duration::from_millis(400)).await;
        settle().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_str(), "batman");

        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn separated_pushes_commit_each_value() {
        let (mut debouncer, mut rx) = Debouncer::new(String::new(), SEARCH_DEBOUNCE);

        debouncer.push("alien".to_string());
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(rx.borrow_and_update().as_str(), "alien");

        debouncer.push("aliens".to_string());
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_str(), "aliens");
    }

    #[tokio::test(start_paused = true)]
    async fn reset_discards_pending_value_silently() {
        let (mut debouncer, mut rx) = Debouncer::new(String::from("old"), SEARCH_DEBOUNCE);

        debouncer.push("typed".to_string());
        assert!(debouncer.is_pending());
        debouncer.reset(String::new());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_str(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn pushing_the_committed_value_is_not_a_transition() {
        let (mut debouncer, rx) = Debouncer::new(String::from("same"), SEARCH_DEBOUNCE);

        debouncer.push("same".to_string());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!rx.has_changed().unwrap());
    }
}
