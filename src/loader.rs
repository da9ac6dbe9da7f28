//! 单值加载状态
//!
//! 仪表盘统计、首页新闻这类一次性数据使用 `Loader<T>`：
//! 与列表相同的序号保护，失败时保留上一次成功的值。

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::observe::{Observable, SubscriptionId};
use crate::resource::FetchOutcome;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadState<T> {
    pub value: Option<T>,
    pub loading: bool,
    pub error: Option<ApiError>,
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        Self {
            value: None,
            loading: false,
            error: None,
        }
    }
}

pub struct Loader<T> {
    state: Observable<LoadState<T>>,
    seq: AtomicU64,
}

impl<T: Clone> Loader<T> {
    pub fn new() -> Self {
        Self {
            state: Observable::new(LoadState::default()),
            seq: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> LoadState<T> {
        self.state.get()
    }

    pub fn value(&self) -> Option<T> {
        self.state.with(|s| s.value.clone())
    }

    pub fn subscribe(&self, f: impl Fn(&LoadState<T>) + Send + Sync + 'static) -> SubscriptionId {
        self.state.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.state.unsubscribe(id);
    }

    /// 执行一次加载；被更新的加载覆盖时丢弃结果
    pub async fn load<F>(&self, request: F) -> FetchOutcome
    where
        F: Future<Output = ApiResult<T>>,
    {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = request.await;
        if self.seq.load(Ordering::SeqCst) != seq {
            debug!(seq, "discarding superseded load");
            return FetchOutcome::Superseded;
        }

        match result {
            Ok(value) => {
                self.state.update(|s| {
                    s.value = Some(value);
                    s.loading = false;
                });
                FetchOutcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "load failed");
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(e);
                });
                FetchOutcome::Failed
            }
        }
    }
}

impl<T: Clone> Default for Loader<T> {
    fn default() -> Self {
        Self::new()
    }
}
