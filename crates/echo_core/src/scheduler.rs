//! Periodic background callbacks with scoped lifetime.
//!
//! # Invariants
//! - The callback runs on one dedicated thread, never concurrently with
//!   itself.
//! - Dropping the [`TickerGuard`] stops the loop and joins the thread;
//!   a tick already running finishes first.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, error};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lower bound applied to tick intervals.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Builder for a periodic background callback.
#[derive(Debug, Clone)]
pub struct Ticker {
    name: String,
    interval: Duration,
    fire_immediately: bool,
}

impl Ticker {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval: interval.max(MIN_TICK_INTERVAL),
            fire_immediately: false,
        }
    }

    /// Runs the first tick right after spawn instead of one interval later.
    pub fn fire_immediately(mut self, yes: bool) -> Self {
        self.fire_immediately = yes;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawns the loop; it runs until the returned guard is dropped.
    pub fn spawn<F>(self, mut tick: F) -> io::Result<TickerGuard>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let Ticker {
            name,
            interval,
            fire_immediately,
        } = self;
        let thread_name = name.clone();

        let handle = thread::Builder::new().name(thread_name).spawn(move || {
            debug!(
                "event=ticker_start module=scheduler status=ok name={name} interval_ms={}",
                interval.as_millis()
            );
            if fire_immediately {
                tick();
            }
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("event=ticker_stop module=scheduler status=ok name={name}");
        })?;

        Ok(TickerGuard {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

/// Owns a running ticker thread.
#[must_use = "dropping the guard stops the ticker"]
#[derive(Debug)]
pub struct TickerGuard {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TickerGuard {
    /// Stops the loop and waits for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("event=ticker_join module=scheduler status=error reason=panicked");
            }
        }
    }
}

impl Drop for TickerGuard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn ticks_until_guard_is_dropped() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let guard = Ticker::new("test-ticker", Duration::from_millis(10))
            .spawn(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .expect("spawn ticker");

        let deadline = Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        drop(guard);

        let after_stop = count.load(Ordering::SeqCst);
        assert!(after_stop >= 3);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn fire_immediately_runs_first_tick_without_waiting() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let guard = Ticker::new("test-immediate", Duration::from_secs(3600))
            .fire_immediately(true)
            .spawn(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .expect("spawn ticker");

        let deadline = Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        guard.stop();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn interval_is_clamped_to_minimum() {
        let ticker = Ticker::new("tiny", Duration::ZERO);
        assert_eq!(ticker.interval(), MIN_TICK_INTERVAL);
    }
}
