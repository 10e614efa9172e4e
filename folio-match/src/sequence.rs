//! Monotonic load sequencing.
//!
//! Every chapter or page load takes a [`LoadTicket`] before it starts.
//! When the load finishes it commits through the same [`LoadSequencer`];
//! a ticket that is no longer the newest is rejected, so a slow earlier
//! load can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{MatchError, Result};

/// Identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct LoadSequencer {
    latest: AtomicU64,
}

impl LoadSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load, invalidating every earlier ticket.
    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Sequence number of the newest ticket issued, 0 before any load.
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Accept `value` only if `ticket` is still the newest load.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Superseded`] for stale tickets; the value is
    /// dropped.
    pub fn commit<T>(&self, ticket: LoadTicket, value: T) -> Result<T> {
        if self.is_current(ticket) {
            Ok(value)
        } else {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.latest(),
                "discarding stale load"
            );
            Err(MatchError::Superseded(ticket.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn tickets_increase() {
        let seq = LoadSequencer::new();
        assert_eq!(seq.latest(), 0);
        let a = seq.begin();
        let b = seq.begin();
        assert!(b > a);
        assert_eq!(b.sequence(), 2);
    }

    #[test]
    fn only_newest_ticket_commits() {
        let seq = LoadSequencer::new();
        let a = seq.begin();
        assert!(seq.is_current(a));
        let b = seq.begin();
        assert!(!seq.is_current(a));

        let err = seq.commit(a, "old").unwrap_err();
        assert!(matches!(err, MatchError::Superseded(1)));
        assert_eq!(seq.commit(b, "new").expect("current"), "new");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_earlier_load_is_discarded() {
        let seq = Arc::new(LoadSequencer::new());

        let slow = {
            let seq = seq.clone();
            let ticket = seq.begin();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                seq.commit(ticket, 1)
            })
        };
        let fast = {
            let seq = seq.clone();
            let ticket = seq.begin();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                seq.commit(ticket, 2)
            })
        };

        assert_eq!(fast.await.expect("join").expect("fast commits"), 2);
        assert!(matches!(
            slow.await.expect("join"),
            Err(MatchError::Superseded(_))
        ));
    }
}
