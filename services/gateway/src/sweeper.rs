use crate::metrics;
use security::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Periodically drop expired sessions so the store stays bounded
pub async fn run_session_sweeper(store: Arc<SessionStore>, every: Duration) {
    let mut interval = interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Session sweeper started (every {:?})", every);

    loop {
        interval.tick().await;

        let removed = store.sweep_expired();
        metrics::SESSIONS_SWEPT.inc_by(removed as u64);
        metrics::observe_sessions(&store);

        debug!("Session sweep removed {} ({} remaining)", removed, store.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use security::{ManualClock, SessionConfig};

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_sessions() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(SessionStore::with_clock(SessionConfig::default(), clock.clone()));
        let token = store.create("user");

        let handle = tokio::spawn(run_session_sweeper(store.clone(), Duration::from_secs(60)));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.len(), 1);

        clock.advance(chrono::Duration::minutes(31));
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(store.is_empty());
        assert!(!store.validate(&token));
        handle.abort();
    }
}
