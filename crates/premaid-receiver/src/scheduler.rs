//! Telemetry request pacing.
//!
//! A full 32-servo response is about 500 bytes, against roughly 10 kB/s of
//! line capacity at 115200 baud, so the board is polled one page at a time.
//! Successive requests always alternate between the two pages.
//!
//! ## Modes
//!
//! - **Idle**: nothing is requested unless asked.
//! - **SingleShotPending**: a one-off request went out since the last tick.
//! - **Continuous**: one request per poll interval, driven by elapsed time.

use std::time::Duration;

use premaid_protocol::Page;
use tracing::{debug, warn};

/// Default time between continuous-mode requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Default cap on requests issued by a single tick after a stall.
pub const DEFAULT_MAX_CATCHUP: u32 = 4;

/// Scheduler mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// No automatic polling.
    Idle,
    /// A single read was requested and the next tick has not run yet.
    SingleShotPending,
    /// Polling every interval.
    Continuous,
}

/// Decides when telemetry requests go out and for which page.
#[derive(Debug, Clone)]
pub struct PollScheduler {
    mode: PollMode,
    next_page: Page,
    elapsed: Duration,
    interval: Duration,
    max_catchup: u32,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_CATCHUP)
    }
}

impl PollScheduler {
    /// Create an idle scheduler starting at page 0.
    ///
    /// A zero interval is raised to one millisecond and a zero catch-up cap to
    /// one request, so a tick always terminates.
    pub fn new(interval: Duration, max_catchup: u32) -> Self {
        PollScheduler {
            mode: PollMode::Idle,
            next_page: Page::Low,
            elapsed: Duration::ZERO,
            interval: interval.max(Duration::from_millis(1)),
            max_catchup: max_catchup.max(1),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> PollMode {
        self.mode
    }

    /// Whether continuous polling is on.
    pub fn is_continuous(&self) -> bool {
        self.mode == PollMode::Continuous
    }

    /// Page the next request will ask for.
    pub fn next_page(&self) -> Page {
        self.next_page
    }

    /// Time accumulated towards the next continuous request.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Poll interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Turn continuous polling on or off.
    ///
    /// Returns true only when the mode actually changed. Enabling restarts
    /// the interval timer from zero.
    pub fn set_continuous_mode(&mut self, enabled: bool) -> bool {
        if self.is_continuous() == enabled {
            return false;
        }

        debug!(enabled, "continuous mode changed");
        if enabled {
            self.mode = PollMode::Continuous;
            self.elapsed = Duration::ZERO;
        } else {
            self.mode = PollMode::Idle;
        }
        true
    }

    /// Ask for one read outside continuous mode.
    ///
    /// Returns the page to request, or `None` while continuous polling is on.
    /// The page does not change until [`advance`](Self::advance) confirms the
    /// request went out.
    pub fn request_single_read(&mut self) -> Option<Page> {
        if self.is_continuous() {
            return None;
        }
        self.mode = PollMode::SingleShotPending;
        Some(self.next_page)
    }

    /// Advance time and return how many requests are due.
    ///
    /// Each full interval accumulated yields one request; the remainder
    /// carries over to the next tick. Send each one for
    /// [`next_page`](Self::next_page), calling [`advance`](Self::advance)
    /// after every successful send.
    pub fn tick(&mut self, elapsed: Duration) -> u32 {
        match self.mode {
            PollMode::Idle => return 0,
            PollMode::SingleShotPending => {
                self.mode = PollMode::Idle;
                return 0;
            }
            PollMode::Continuous => {}
        }

        self.elapsed += elapsed;
        let mut due = 0;
        while self.elapsed >= self.interval {
            if due == self.max_catchup {
                warn!(
                    behind_ms = self.elapsed.as_millis() as u64,
                    "poll loop stalled, skipping missed requests"
                );
                self.elapsed = Duration::ZERO;
                break;
            }
            self.elapsed -= self.interval;
            due += 1;
        }
        due
    }

    /// Record that a request for [`next_page`](Self::next_page) was sent.
    pub fn advance(&mut self) {
        self.next_page = self.next_page.next();
    }

    /// Put `count` due requests that could not be sent back on the timer.
    ///
    /// Only applies in continuous mode, and never holds more than the
    /// catch-up cap.
    pub fn defer(&mut self, count: u32) {
        if !self.is_continuous() || count == 0 {
            return;
        }
        let backlog = self.elapsed + self.interval * count.min(self.max_catchup);
        self.elapsed = backlog.min(self.interval * self.max_catchup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(50);

    /// Drive `ticks` ticks, recording every page a sender would request.
    fn run(scheduler: &mut PollScheduler, ticks: usize, elapsed: Duration) -> Vec<Page> {
        let mut pages = Vec::new();
        for _ in 0..ticks {
            for _ in 0..scheduler.tick(elapsed) {
                pages.push(scheduler.next_page());
                scheduler.advance();
            }
        }
        pages
    }

    #[test]
    fn test_four_ticks_make_one_request() {
        let mut scheduler = PollScheduler::default();
        scheduler.set_continuous_mode(true);

        assert_eq!(scheduler.tick(TICK), 0);
        assert_eq!(scheduler.tick(TICK), 0);
        assert_eq!(scheduler.tick(TICK), 0);
        assert_eq!(scheduler.tick(TICK), 1);
        assert_eq!(scheduler.next_page(), Page::Low);
        assert_eq!(scheduler.elapsed(), Duration::ZERO);

        scheduler.advance();
        assert_eq!(scheduler.next_page(), Page::High);
    }

    #[test]
    fn test_pages_alternate() {
        let mut scheduler = PollScheduler::default();
        scheduler.set_continuous_mode(true);

        let pages = run(&mut scheduler, 4, DEFAULT_POLL_INTERVAL);
        assert_eq!(pages, vec![Page::Low, Page::High, Page::Low, Page::High]);
    }

    #[test]
    fn test_time_jump_catches_up() {
        let mut scheduler = PollScheduler::default();
        scheduler.set_continuous_mode(true);

        let pages = run(&mut scheduler, 1, Duration::from_millis(650));
        assert_eq!(pages, vec![Page::Low, Page::High, Page::Low]);
        assert_eq!(scheduler.elapsed(), Duration::from_millis(50));
    }

    #[test]
    fn test_catchup_is_capped() {
        let mut scheduler = PollScheduler::new(DEFAULT_POLL_INTERVAL, 2);
        scheduler.set_continuous_mode(true);

        assert_eq!(run(&mut scheduler, 1, Duration::from_secs(10)).len(), 2);
        assert_eq!(scheduler.elapsed(), Duration::ZERO);
        assert_eq!(scheduler.next_page(), Page::Low);
    }

    #[test]
    fn test_page_holds_until_advanced() {
        let mut scheduler = PollScheduler::default();
        scheduler.set_continuous_mode(true);

        assert_eq!(scheduler.tick(DEFAULT_POLL_INTERVAL), 1);
        // Send failed: no advance.
        assert_eq!(scheduler.tick(DEFAULT_POLL_INTERVAL), 1);
        assert_eq!(scheduler.next_page(), Page::Low);
    }

    #[test]
    fn test_defer_returns_requests_to_timer() {
        let mut scheduler = PollScheduler::default();
        scheduler.set_continuous_mode(true);

        assert_eq!(scheduler.tick(Duration::from_millis(450)), 2);
        scheduler.defer(2);
        assert_eq!(scheduler.elapsed(), Duration::from_millis(450));
        assert_eq!(scheduler.tick(Duration::ZERO), 2);
    }

    #[test]
    fn test_defer_bounded_by_cap() {
        let mut scheduler = PollScheduler::new(DEFAULT_POLL_INTERVAL, 2);
        scheduler.set_continuous_mode(true);

        scheduler.defer(10);
        assert_eq!(scheduler.elapsed(), DEFAULT_POLL_INTERVAL * 2);
    }

    #[test]
    fn test_defer_ignored_when_idle() {
        let mut scheduler = PollScheduler::default();
        scheduler.defer(3);
        assert_eq!(scheduler.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_mode_change_reported_once() {
        let mut scheduler = PollScheduler::default();
        assert!(scheduler.set_continuous_mode(true));
        assert!(!scheduler.set_continuous_mode(true));
        assert!(scheduler.set_continuous_mode(false));
        assert!(!scheduler.set_continuous_mode(false));
    }

    #[test]
    fn test_enabling_resets_timer() {
        let mut scheduler = PollScheduler::default();
        scheduler.set_continuous_mode(true);
        scheduler.tick(Duration::from_millis(150));
        scheduler.set_continuous_mode(false);
        scheduler.set_continuous_mode(true);

        assert_eq!(scheduler.elapsed(), Duration::ZERO);
        assert_eq!(scheduler.tick(TICK), 0);
    }

    #[test]
    fn test_single_read_flips_page_on_advance() {
        let mut scheduler = PollScheduler::default();
        assert_eq!(scheduler.request_single_read(), Some(Page::Low));
        assert_eq!(scheduler.mode(), PollMode::SingleShotPending);
        assert_eq!(scheduler.request_single_read(), Some(Page::Low));

        scheduler.advance();
        assert_eq!(scheduler.request_single_read(), Some(Page::High));

        assert_eq!(scheduler.tick(TICK), 0);
        assert_eq!(scheduler.mode(), PollMode::Idle);
    }

    #[test]
    fn test_single_read_ignored_while_continuous() {
        let mut scheduler = PollScheduler::default();
        scheduler.set_continuous_mode(true);
        assert_eq!(scheduler.request_single_read(), None);
        assert_eq!(scheduler.next_page(), Page::Low);
    }

    #[test]
    fn test_idle_ticks_do_nothing() {
        let mut scheduler = PollScheduler::default();
        assert_eq!(scheduler.tick(Duration::from_secs(5)), 0);
        assert_eq!(scheduler.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_zero_interval_clamped() {
        let scheduler = PollScheduler::new(Duration::ZERO, 0);
        assert_eq!(scheduler.interval(), Duration::from_millis(1));
    }
}
