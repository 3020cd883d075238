use std::time::Duration;
use tokio::time::Instant;

/// Pausable elapsed-time accumulator.
///
/// Elapsed time is derived from instant deltas rather than tick counting, so a
/// throttled or suspended event loop cannot make it drift. Pausing folds the
/// running delta into `accumulated`; resuming re-anchors.
#[derive(Debug, Clone, Default)]
pub struct ElapsedTimer {
    accumulated: Duration,
    anchor: Option<Instant>,
}

impl ElapsedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to zero and start running
    pub fn start(&mut self) {
        self.accumulated = Duration::ZERO;
        self.anchor = Some(Instant::now());
    }

    /// Freeze at the current value
    pub fn pause(&mut self) {
        if let Some(anchor) = self.anchor.take() {
            self.accumulated += anchor.elapsed();
        }
    }

    /// Continue from the frozen value
    pub fn resume(&mut self) {
        if self.anchor.is_none() {
            self.anchor = Some(Instant::now());
        }
    }

    /// Stop running and zero the accumulator
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.anchor = None;
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.anchor.map(|a| a.elapsed()).unwrap_or_default()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Whole seconds, floor-rounded
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_timer_counts_while_running() {
        let mut timer = ElapsedTimer::new();
        timer.start();

        advance(Duration::from_millis(2500)).await;

        assert_eq!(timer.elapsed_ms(), 2500);
        assert_eq!(timer.elapsed_secs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_interval_is_excluded() {
        let mut timer = ElapsedTimer::new();
        timer.start();
        advance(Duration::from_secs(3)).await;

        timer.pause();
        advance(Duration::from_secs(10)).await;
        assert_eq!(timer.elapsed_secs(), 3);

        timer.resume();
        advance(Duration::from_secs(2)).await;
        assert_eq!(timer.elapsed_secs(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_pause_and_resume_are_harmless() {
        let mut timer = ElapsedTimer::new();
        timer.start();
        advance(Duration::from_secs(1)).await;

        timer.pause();
        timer.pause();
        advance(Duration::from_secs(1)).await;
        timer.resume();
        timer.resume();
        advance(Duration::from_secs(1)).await;

        assert_eq!(timer.elapsed_secs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_resets_accumulator() {
        let mut timer = ElapsedTimer::new();
        timer.start();
        advance(Duration::from_secs(4)).await;

        timer.start();
        assert_eq!(timer.elapsed_ms(), 0);

        timer.reset();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }
}
