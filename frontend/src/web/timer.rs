//! 定时器封装模块
//!
//! 使用 `web_sys` 的原生 `setTimeout`，并据此实现核心层防抖所需的 `Sleeper`。

use std::cell::RefCell;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::oneshot;
use libris::debounce::Sleeper;
use tracing::warn;
use wasm_bindgen::prelude::*;

/// 一次性定时器
///
/// 封装 `setTimeout` API。当 `Timeout` 被 drop 时，自动清除尚未触发的定时器。
pub struct Timeout {
    handle: i32,
    #[allow(dead_code)]
    closure: Closure<dyn Fn()>,
}

impl Timeout {
    /// 创建定时器；无法获取 window 或设置失败时返回 `None`
    pub fn new<F>(millis: u32, callback: F) -> Option<Self>
    where
        F: Fn() + 'static,
    {
        let closure = Closure::<dyn Fn()>::new(callback);
        let window = web_sys::window()?;

        let handle = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                i32::try_from(millis).unwrap_or(i32::MAX),
            )
            .ok()?;

        Some(Self { handle, closure })
    }

    fn cancel(&self) {
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(self.handle);
        }
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// 基于 `setTimeout` 的延时
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutSleeper;

#[async_trait(?Send)]
impl Sleeper for TimeoutSleeper {
    async fn sleep(&self, duration: Duration) {
        let (tx, rx) = oneshot::channel::<()>();
        let tx = RefCell::new(Some(tx));
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);

        let Some(_timeout) = Timeout::new(millis, move || {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(());
            }
        }) else {
            warn!(millis, "setTimeout unavailable, skipping delay");
            return;
        };
        let _ = rx.await;
    }
}
