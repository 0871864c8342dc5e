//! Seconds-left ticker for an open step-up challenge.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Publishes the remaining seconds once per second until zero.
///
/// The ticker task is aborted on `stop` and on drop. Outside a tokio runtime
/// no task is spawned and the value stays at its start.
#[derive(Debug)]
pub struct Countdown {
    rx: watch::Receiver<u64>,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn start(total: Duration) -> Self {
        let seconds = total.as_secs();
        let (tx, rx) = watch::channel(seconds);

        let task = tokio::runtime::Handle::try_current().ok().map(|handle| {
            handle.spawn(async move {
                let mut left = seconds;
                let mut ticker = tokio::time::interval(Duration::from_secs(1));
                // first tick completes immediately
                ticker.tick().await;
                while left > 0 {
                    ticker.tick().await;
                    left -= 1;
                    if tx.send(left).is_err() {
                        break;
                    }
                }
            })
        });

        Self { rx, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.rx.clone()
    }

    pub fn seconds_left(&self) -> u64 {
        *self.rx.borrow()
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_down_to_zero() {
        let countdown = Countdown::start(Duration::from_secs(3));
        let mut rx = countdown.subscribe();
        assert_eq!(*rx.borrow(), 3);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(countdown.seconds_left(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_the_value() {
        let mut countdown = Countdown::start(Duration::from_secs(30));
        countdown.stop();
        assert!(!countdown.is_running());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(countdown.seconds_left(), 30);
    }

    #[test]
    fn without_runtime_nothing_is_spawned() {
        let countdown = Countdown::start(Duration::from_secs(30));
        assert!(!countdown.is_running());
        assert_eq!(countdown.seconds_left(), 30);
    }
}
