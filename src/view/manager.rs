//! Load, render and bind cycles for one region.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::region::RenderRegion;
use super::template::TemplateRenderer;
use crate::cancel::{CancellationSource, CancellationToken};
use crate::config::ViewConfig;
use crate::error::ApiError;
use crate::lock;

/// Hook run on the fetched model before it is rendered.
pub type Preprocess = Box<dyn FnOnce(&mut Value) + Send>;

/// A successfully rendered view.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    /// The model after preprocessing
    pub model: Value,
    /// Rendered markup; `None` when the template was missing or failed
    pub html: Option<String>,
}

/// How a load cycle ended.
#[derive(Debug)]
pub enum LoadOutcome {
    Completed(RenderedView),
    /// Superseded by a newer `start`, aborted, or the manager was dropped.
    Cancelled,
    Failed(ApiError),
}

impl LoadOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, LoadOutcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadOutcome::Cancelled)
    }
}

/// Handle to one started cycle; resolves to its [`LoadOutcome`].
#[derive(Debug)]
pub struct LoadCycle {
    id: u64,
    receiver: oneshot::Receiver<LoadOutcome>,
}

impl LoadCycle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Future for LoadCycle {
    type Output = LoadOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(LoadOutcome::Cancelled))
    }
}

struct ActiveCycle {
    id: u64,
    cancel: CancellationSource,
    result: Option<oneshot::Sender<LoadOutcome>>,
    loading_timer: Option<JoinHandle<()>>,
}

impl ActiveCycle {
    fn resolve(&mut self, outcome: LoadOutcome) {
        if let Some(timer) = self.loading_timer.take() {
            timer.abort();
        }
        if let Some(sender) = self.result.take() {
            // The caller may have dropped its LoadCycle
            let _ = sender.send(outcome);
        }
    }
}

struct Shared {
    region: Arc<dyn RenderRegion>,
    renderer: Arc<dyn TemplateRenderer>,
    loading_delay: Duration,
    active: Mutex<Option<ActiveCycle>>,
    next_id: AtomicU64,
}

impl Shared {
    fn abort(&self) {
        let Some(mut cycle) = lock(&self.active).take() else {
            return;
        };
        tracing::debug!(cycle = cycle.id, "Aborting view load");
        cycle.cancel.cancel();
        self.region.set_loading(false);
        cycle.resolve(LoadOutcome::Cancelled);
    }

    fn show_loading(&self, id: u64) {
        let active = lock(&self.active);
        if matches!(active.as_ref(), Some(cycle) if cycle.id == id) {
            self.region.set_loading(true);
        }
    }

    fn finish(
        &self,
        id: u64,
        result: Result<Value, ApiError>,
        template: &str,
        preprocess: Option<Preprocess>,
    ) {
        // Held to the end so a newer start cannot interleave with rendering
        let mut active = lock(&self.active);
        if !matches!(active.as_ref(), Some(cycle) if cycle.id == id) {
            return;
        }
        let Some(mut cycle) = active.take() else {
            return;
        };
        if let Some(timer) = cycle.loading_timer.take() {
            timer.abort();
        }

        let outcome = match result {
            Ok(mut model) => {
                if let Some(preprocess) = preprocess {
                    preprocess(&mut model);
                }
                let html = self.render(template, &model);
                LoadOutcome::Completed(RenderedView { model, html })
            }
            Err(e) if e.is_cancelled() => LoadOutcome::Cancelled,
            Err(e) => {
                tracing::warn!(cycle = id, error = %e, "View load failed");
                LoadOutcome::Failed(e)
            }
        };

        self.region.set_loading(false);
        cycle.resolve(outcome);
    }

    fn render(&self, template: &str, model: &Value) -> Option<String> {
        if template.is_empty() {
            return None;
        }

        match self.renderer.render(template, model) {
            Ok(Some(html)) => {
                self.region.set_html(html.clone());
                self.region.init_dependent_controls();
                Some(html)
            }
            Ok(None) => {
                tracing::error!(template = %template, "Missing template");
                None
            }
            Err(e) => {
                tracing::error!(template = %template, error = %e, "Template render failed");
                None
            }
        }
    }
}

/// Drives load cycles for a single region.
///
/// Only the most recently started cycle may touch the region: `start`
/// aborts whatever is in flight, and late results of aborted cycles are
/// discarded. Dropping the manager aborts the active cycle.
pub struct ViewManager {
    shared: Arc<Shared>,
}

impl ViewManager {
    pub fn new(
        region: Arc<dyn RenderRegion>,
        renderer: Arc<dyn TemplateRenderer>,
        config: &ViewConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                region,
                renderer,
                loading_delay: config.loading_delay(),
                active: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Start a new cycle: fetch the model, render `template` with it and
    /// bind the result into the region.
    ///
    /// `fetch` receives the cycle's cancellation token. An empty template
    /// name fetches without rendering. Must be called within a tokio
    /// runtime.
    pub fn start<F, Fut>(
        &self,
        fetch: F,
        template: impl Into<String>,
        preprocess: Option<Preprocess>,
    ) -> LoadCycle
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
    {
        self.abort();

        let shared = &self.shared;
        shared.region.clear();
        shared.region.scroll_to_top();

        let id = shared.next_id.fetch_add(1, Ordering::Relaxed);
        let template = template.into();
        let cancel = CancellationSource::new();
        let token = cancel.token();
        let (sender, receiver) = oneshot::channel();

        tracing::debug!(cycle = id, template = %template, "Starting view load");

        let fetch = fetch(token.clone());

        // Register before spawning so neither task can miss the cycle
        let mut active = lock(&shared.active);
        let loading_timer = {
            let shared = Arc::clone(shared);
            tokio::spawn(async move {
                tokio::time::sleep(shared.loading_delay).await;
                shared.show_loading(id);
            })
        };
        *active = Some(ActiveCycle {
            id,
            cancel,
            result: Some(sender),
            loading_timer: Some(loading_timer),
        });
        drop(active);

        let task_shared = Arc::clone(shared);
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                result = fetch => result,
            };
            task_shared.finish(id, result, &template, preprocess);
        });

        LoadCycle { id, receiver }
    }

    /// Cancel the active cycle, if any, and clear the loading indicator.
    pub fn abort(&self) -> &Self {
        self.shared.abort();
        self
    }

    /// Whether a cycle is in flight.
    pub fn is_active(&self) -> bool {
        lock(&self.shared.active).is_some()
    }
}

impl Drop for ViewManager {
    fn drop(&mut self) {
        self.shared.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{HandlebarsRenderer, MemoryRegion};
    use serde_json::json;

    fn manager(delay_ms: u64) -> (ViewManager, MemoryRegion) {
        let region = MemoryRegion::new();
        let mut renderer = HandlebarsRenderer::new();
        renderer
            .register_template("goal", "<h2>{{name}}</h2>")
            .unwrap();
        let config = ViewConfig {
            loading_delay_ms: delay_ms,
        };
        let manager = ViewManager::new(Arc::new(region.clone()), Arc::new(renderer), &config);
        (manager, region)
    }

    #[tokio::test]
    async fn test_completed_cycle_renders() {
        let (manager, region) = manager(100);

        let outcome = manager
            .start(|_| async { Ok(json!({"name": "Retire"})) }, "goal", None)
            .await;

        match outcome {
            LoadOutcome::Completed(view) => {
                assert_eq!(view.html.as_deref(), Some("<h2>Retire</h2>"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(region.html(), "<h2>Retire</h2>");
        assert_eq!(region.clear_count(), 1);
        assert_eq!(region.scroll_reset_count(), 1);
        assert!(!manager.is_active());
    }

    #[tokio::test]
    async fn test_preprocess_runs_before_render() {
        let (manager, region) = manager(100);
        let preprocess: Preprocess = Box::new(|model| {
            model["name"] = json!("Edited");
        });

        let outcome = manager
            .start(|_| async { Ok(json!({"name": "Raw"})) }, "goal", Some(preprocess))
            .await;

        assert!(outcome.is_completed());
        assert_eq!(region.html(), "<h2>Edited</h2>");
    }

    #[tokio::test]
    async fn test_abort_when_idle_is_noop() {
        let (manager, region) = manager(100);
        manager.abort().abort();
        assert!(region.loading_history().is_empty());
        assert!(!manager.is_active());
    }

    #[tokio::test]
    async fn test_abort_resolves_cancelled() {
        let (manager, region) = manager(100);

        let cycle = manager.start(
            |_| std::future::pending::<Result<Value, ApiError>>(),
            "goal",
            None,
        );
        assert!(manager.is_active());
        manager.abort();

        assert!(cycle.await.is_cancelled());
        assert_eq!(region.loading_history(), vec![false]);
        assert_eq!(region.html(), "");
    }

    #[tokio::test]
    async fn test_fetch_sees_cancellation() {
        let (manager, _) = manager(100);
        let (seen_tx, seen_rx) = oneshot::channel();

        let cycle = manager.start(
            move |token| async move {
                token.cancelled().await;
                let _ = seen_tx.send(());
                Err(ApiError::Cancelled)
            },
            "goal",
            None,
        );
        manager.abort();

        assert!(cycle.await.is_cancelled());
        // The select drops the fetch future once cancelled
        assert!(seen_rx.await.is_err());
    }

    #[tokio::test]
    async fn test_failure_leaves_region_cleared() {
        let (manager, region) = manager(100);
        region.set_html("<p>previous</p>".to_string());

        let outcome = manager
            .start(
                |_| async {
                    Err(ApiError::Transport(crate::error::TransportError::Network(
                        "refused".into(),
                    )))
                },
                "goal",
                None,
            )
            .await;

        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert_eq!(region.html(), "");
        assert_eq!(region.loading_history().last(), Some(&false));
    }

    #[tokio::test]
    async fn test_drop_aborts_active_cycle() {
        let (manager, _) = manager(100);
        let cycle = manager.start(
            |_| std::future::pending::<Result<Value, ApiError>>(),
            "goal",
            None,
        );
        drop(manager);
        assert!(cycle.await.is_cancelled());
    }
}
