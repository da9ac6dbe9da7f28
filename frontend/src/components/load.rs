//! 单值数据的加载句柄（仪表盘统计、首页新闻、详情页）

use std::future::Future;
use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use libris::ApiResult;
use libris::loader::{LoadState, Loader};

pub struct LoadHandle<T: Send + Sync + 'static> {
    loader: StoredValue<Arc<Loader<T>>>,
    state: RwSignal<LoadState<T>>,
}

impl<T: Send + Sync + 'static> Clone for LoadHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Send + Sync + 'static> Copy for LoadHandle<T> {}

impl<T: Clone + Send + Sync + 'static> LoadHandle<T> {
    /// 随当前组件创建，组件卸载时取消订阅
    pub fn new() -> Self {
        let loader = Arc::new(Loader::new());
        let state = RwSignal::new(loader.state());
        let id = loader.subscribe(move |snapshot| {
            let _ = state.try_set(snapshot.clone());
        });

        let subscribed = Arc::clone(&loader);
        on_cleanup(move || subscribed.unsubscribe(id));

        Self {
            loader: StoredValue::new(loader),
            state,
        }
    }

    pub fn state(&self) -> RwSignal<LoadState<T>> {
        self.state
    }

    pub fn load<F>(&self, request: F)
    where
        F: Future<Output = ApiResult<T>> + 'static,
    {
        let loader = self.loader.get_value();
        spawn_local(async move {
            loader.load(request).await;
        });
    }
}

/// 加载中 / 错误 / 内容三态
pub fn load_view<T, V>(
    handle: LoadHandle<T>,
    render: impl Fn(T) -> V + Send + Sync + 'static,
) -> impl IntoView
where
    T: Clone + Send + Sync + 'static,
    V: IntoView + 'static,
{
    let state = handle.state();
    move || {
        let (value, error) = state.with(|s| {
            (s.value.clone(), s.error.as_ref().map(|e| e.message().to_string()))
        });
        match (value, error) {
            (_, Some(message)) => view! {
                <div role="alert" class="alert alert-error">
                    <span>{message}</span>
                </div>
            }
            .into_any(),
            (Some(value), None) => render(value).into_any(),
            (None, None) => view! {
                <div class="flex justify-center py-12">
                    <span class="loading loading-spinner loading-lg text-primary"></span>
                </div>
            }
            .into_any(),
        }
    }
}
