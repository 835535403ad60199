//! Progressive reveal of lazily loaded gallery content.
//!
//! The page shows an initial batch of looks and a "Load More" button further
//! down. We scroll in small steps and try the button after each step; once it
//! has been clicked the remaining looks arrive in one batch.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::browser::{ControlLookup, Locator, PageSession};

/// Tuning for [`reveal`].
#[derive(Debug, Clone)]
pub struct RevealOptions {
    /// Pixels scrolled per attempt.
    pub scroll_step: u32,
    /// Lookups that may miss before giving up.
    pub max_attempts: u32,
    /// Pause after each scroll so the page can react.
    pub scroll_pause: Duration,
    /// Control that loads the rest of the collection.
    pub control: Locator,
    /// Bound on each control lookup.
    pub control_timeout: Duration,
    /// Upper bound on waiting for content after the control was clicked.
    pub load_wait: Duration,
    /// Elements whose count tracks loaded content. Without it the full
    /// `load_wait` elapses after a click.
    pub settle_selector: Option<String>,
    /// How long the count must hold still to count as settled.
    pub settle_quiet: Duration,
    /// Interval between count checks.
    pub settle_poll: Duration,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            scroll_step: 300,
            max_attempts: 100,
            scroll_pause: Duration::from_millis(500),
            control: Locator::ButtonText("Load More".to_string()),
            control_timeout: Duration::from_secs(2),
            load_wait: Duration::from_secs(5),
            settle_selector: None,
            settle_quiet: Duration::from_secs(1),
            settle_poll: Duration::from_millis(250),
        }
    }
}

/// Progress of one reveal loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealState {
    pub attempts: u32,
    pub max_attempts: u32,
    pub content_loaded: bool,
}

impl RevealState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            content_loaded: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.content_loaded || self.attempts >= self.max_attempts
    }

    fn record_miss(&mut self) {
        self.attempts += 1;
    }

    fn mark_loaded(&mut self) {
        self.content_loaded = true;
    }
}

/// Scroll and trigger the load-more control until the page has loaded
/// everything or `max_attempts` lookups have missed.
///
/// Giving up is not an error: the caller continues with whatever is rendered.
pub async fn reveal<S>(session: &mut S, options: &RevealOptions) -> RevealState
where
    S: PageSession + ?Sized,
{
    let mut state = RevealState::new(options.max_attempts);

    while !state.is_finished() {
        if let Err(e) = session.scroll_by(options.scroll_step).await {
            debug!("Scroll failed: {}", e);
        }
        tokio::time::sleep(options.scroll_pause).await;

        match session
            .activate(&options.control, options.control_timeout)
            .await
        {
            Ok(ControlLookup::Activated) => {
                info!("Clicked 'Load More' button, waiting for content to load");
                wait_for_content(session, options).await;
                state.mark_loaded();
            }
            Ok(ControlLookup::Absent) => {
                debug!("Load More button not found (attempt {})", state.attempts + 1);
                state.record_miss();
            }
            Err(e) => {
                debug!("Load More lookup failed: {}", e);
                state.record_miss();
            }
        }
    }

    if state.content_loaded {
        info!("Content loaded successfully");
    } else {
        warn!(
            "Could not find more content to load after {} attempts",
            state.attempts
        );
    }

    state
}

/// Wait for newly revealed content, bounded by `load_wait`.
///
/// With a settle selector this returns as soon as the element count has grown
/// and then held still for `settle_quiet`.
async fn wait_for_content<S>(session: &mut S, options: &RevealOptions)
where
    S: PageSession + ?Sized,
{
    let Some(ref selector) = options.settle_selector else {
        tokio::time::sleep(options.load_wait).await;
        return;
    };

    let deadline = Instant::now() + options.load_wait;
    let baseline = session.count_matches(selector).await.unwrap_or(0);
    let mut last_count = baseline;
    let mut last_change = Instant::now();

    loop {
        let now = Instant::now();
        if now >= deadline {
            debug!("Load wait elapsed with {} items", last_count);
            return;
        }
        tokio::time::sleep(options.settle_poll.min(deadline - now)).await;

        let count = match session.count_matches(selector).await {
            Ok(count) => count,
            Err(e) => {
                debug!("Item count failed: {}", e);
                continue;
            }
        };

        if count != last_count {
            last_count = count;
            last_change = Instant::now();
        } else if count > baseline && last_change.elapsed() >= options.settle_quiet {
            debug!("Content settled at {} items (was {})", count, baseline);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowserError;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Page whose load-more control becomes clickable on a given lookup.
    #[derive(Default)]
    struct ScriptedPage {
        clickable_on_lookup: Option<u32>,
        failing_lookups: u32,
        lookups: u32,
        scrolls: Vec<u32>,
        counts: VecDeque<usize>,
    }

    #[async_trait]
    impl PageSession for ScriptedPage {
        async fn navigate(&mut self, _url: &str) -> Result<(), BrowserError> {
            Ok(())
        }

        async fn run_script(&mut self, _source: &str) -> Result<serde_json::Value, BrowserError> {
            Ok(serde_json::Value::Null)
        }

        async fn activate(
            &mut self,
            _locator: &Locator,
            _timeout: Duration,
        ) -> Result<ControlLookup, BrowserError> {
            self.lookups += 1;
            if self.lookups <= self.failing_lookups {
                return Err(BrowserError::Script("Execution context was destroyed".into()));
            }
            match self.clickable_on_lookup {
                Some(n) if self.lookups >= n => Ok(ControlLookup::Activated),
                _ => Ok(ControlLookup::Absent),
            }
        }

        async fn current_markup(&mut self) -> Result<String, BrowserError> {
            Ok(String::new())
        }

        async fn close(&mut self) {}

        async fn scroll_by(&mut self, pixels: u32) -> Result<(), BrowserError> {
            self.scrolls.push(pixels);
            Ok(())
        }

        async fn count_matches(&mut self, _selector: &str) -> Result<usize, BrowserError> {
            if self.counts.len() > 1 {
                Ok(self.counts.pop_front().unwrap_or(0))
            } else {
                Ok(self.counts.front().copied().unwrap_or(0))
            }
        }
    }

    fn fast_options(max_attempts: u32) -> RevealOptions {
        RevealOptions {
            max_attempts,
            scroll_pause: Duration::ZERO,
            control_timeout: Duration::ZERO,
            load_wait: Duration::ZERO,
            settle_poll: Duration::from_millis(1),
            settle_quiet: Duration::from_millis(5),
            ..RevealOptions::default()
        }
    }

    #[tokio::test]
    async fn test_control_found_within_budget() {
        let mut page = ScriptedPage {
            clickable_on_lookup: Some(3),
            ..Default::default()
        };
        let state = reveal(&mut page, &fast_options(10)).await;

        assert!(state.content_loaded);
        assert_eq!(state.attempts, 2);
        assert_eq!(page.lookups, 3);
        assert_eq!(page.scrolls, vec![300, 300, 300]);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let mut page = ScriptedPage::default();
        let state = reveal(&mut page, &fast_options(7)).await;

        assert!(!state.content_loaded);
        assert_eq!(state.attempts, 7);
        assert_eq!(state.max_attempts, 7);
        assert_eq!(page.lookups, 7);
    }

    #[tokio::test]
    async fn test_zero_attempts_does_nothing() {
        let mut page = ScriptedPage {
            clickable_on_lookup: Some(1),
            ..Default::default()
        };
        let state = reveal(&mut page, &fast_options(0)).await;

        assert_eq!(state, RevealState::new(0));
        assert!(page.scrolls.is_empty());
        assert_eq!(page.lookups, 0);
    }

    #[tokio::test]
    async fn test_lookup_errors_count_as_misses() {
        let mut page = ScriptedPage {
            clickable_on_lookup: Some(4),
            failing_lookups: 2,
            ..Default::default()
        };
        let state = reveal(&mut page, &fast_options(5)).await;

        assert!(state.content_loaded);
        assert_eq!(state.attempts, 3);
    }

    #[tokio::test]
    async fn test_iterations_bounded_by_budget() {
        for max_attempts in 0..6u32 {
            for clickable in [None, Some(1), Some(3), Some(6), Some(9)] {
                let mut page = ScriptedPage {
                    clickable_on_lookup: clickable,
                    ..Default::default()
                };
                let state = reveal(&mut page, &fast_options(max_attempts)).await;

                assert!(page.lookups <= max_attempts + 1);
                assert!(state.attempts <= state.max_attempts);
                match clickable {
                    Some(n) if n <= max_attempts => assert!(state.content_loaded),
                    _ => {
                        assert!(!state.content_loaded);
                        assert_eq!(state.attempts, max_attempts);
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_settle_returns_once_count_is_stable() {
        let mut page = ScriptedPage {
            clickable_on_lookup: Some(1),
            counts: VecDeque::from(vec![12, 12, 30, 48, 60]),
            ..Default::default()
        };
        let options = RevealOptions {
            load_wait: Duration::from_secs(30),
            settle_selector: Some("#gallery-collection img".to_string()),
            ..fast_options(3)
        };

        let started = std::time::Instant::now();
        let state = reveal(&mut page, &options).await;

        assert!(state.content_loaded);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_settle_bounded_when_nothing_arrives() {
        let mut page = ScriptedPage {
            clickable_on_lookup: Some(1),
            counts: VecDeque::from(vec![12]),
            ..Default::default()
        };
        let options = RevealOptions {
            load_wait: Duration::from_millis(50),
            settle_selector: Some("img".to_string()),
            ..fast_options(3)
        };

        let started = std::time::Instant::now();
        let state = reveal(&mut page, &options).await;

        assert!(state.content_loaded);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
