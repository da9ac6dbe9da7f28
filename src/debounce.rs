//! 输入防抖
//!
//! 每次调用 `settle` 都会使之前仍在等待的调用失效，
//! 只有等待期间没有被新输入打断的值才会被放行。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

/// 平台延时（浏览器使用 setTimeout，测试使用 tokio）
#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

pub struct Debouncer<Z> {
    sleeper: Z,
    delay: Duration,
    generation: AtomicU64,
}

impl<Z: Sleeper> Debouncer<Z> {
    pub fn new(sleeper: Z, delay: Duration) -> Self {
        Self {
            sleeper,
            delay,
            generation: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 等待防抖窗口结束；期间若有更新的调用则返回 `None`
    pub async fn settle<T>(&self, value: T) -> Option<T> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.sleeper.sleep(self.delay).await;

        if self.generation.load(Ordering::SeqCst) == generation {
            Some(value)
        } else {
            None
        }
    }

    /// 丢弃所有等待中的值
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
pub(crate) struct TokioSleeper;

#[cfg(test)]
#[async_trait(?Send)]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn only_last_value_in_window_settles() {
        let debouncer = Debouncer::new(TokioSleeper, Duration::from_millis(400));

        let typed = async {
            let first = debouncer.settle("a");
            let second = async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                debouncer.settle("ab").await
            };
            let third = async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                debouncer.settle("abc").await
            };
            futures::join!(first, second, third)
        };

        assert_eq!(typed.await, (None, None, Some("abc")));
    }

    #[tokio::test(start_paused = true)]
    async fn separated_inputs_both_settle() {
        let debouncer = Debouncer::new(TokioSleeper, Duration::from_millis(400));
        assert_eq!(debouncer.settle(1).await, Some(1));
        assert_eq!(debouncer.settle(2).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_value() {
        let debouncer = Debouncer::new(TokioSleeper, Duration::from_millis(400));
        let pending = debouncer.settle("draft");
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            debouncer.cancel();
        };
        let (value, ()) = futures::join!(pending, cancel);
        assert_eq!(value, None);
    }
}
