use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tickerdash_application::chat::ChatReply;
use tickerdash_application::dashboard::DashboardController;
use tickerdash_domain::value_objects::color::Rgb;
use tickerdash_domain::value_objects::symbol::Symbol;
use tickerdash_infrastructure::export::CsvSnapshotExporter;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    AddTicker,
    Refresh,
    Send,
    Export,
}

impl TaskKind {
    pub fn label(self) -> &'static str {
        match self {
            TaskKind::AddTicker => "add",
            TaskKind::Refresh => "refresh",
            TaskKind::Send => "send",
            TaskKind::Export => "export",
        }
    }
}

/// Render-ready copy of one tracked series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesView {
    pub symbol: Symbol,
    pub color: Rgb,
    pub points: Vec<(i64, f64)>,
}

impl SeriesView {
    pub fn latest(&self) -> Option<(i64, f64)> {
        self.points.last().copied()
    }
}

pub enum TaskEvent {
    Input(crossterm::event::Event),
    View(Vec<SeriesView>),
    Chat(ChatReply),
    TaskFinished(TaskKind, Result<String, String>),
}

/// Runs dashboard actions on the runtime, one controller lock per action.
#[derive(Clone)]
pub struct TaskRunner {
    inner: Arc<TaskRunnerInner>,
}

struct TaskRunnerInner {
    tx: tokio::sync::mpsc::UnboundedSender<TaskEvent>,
    controller: Arc<Mutex<DashboardController>>,
    exporter: CsvSnapshotExporter,
    refreshing: AtomicBool,
}

fn view_of(controller: &DashboardController) -> Vec<SeriesView> {
    controller
        .series()
        .map(|series| SeriesView {
            symbol: series.symbol.clone(),
            color: series.color,
            points: series
                .samples()
                .iter()
                .map(|s| (s.timestamp_ms, s.price))
                .collect(),
        })
        .collect()
}

impl TaskRunnerInner {
    fn emit(&self, event: TaskEvent) {
        let _ = self.tx.send(event);
    }

    fn finish(&self, kind: TaskKind, result: Result<String, String>) {
        let label = if result.is_ok() { "ok" } else { "err" };
        metrics::counter!("tickerdash.tui.tasks_total", "kind" => kind.label(), "result" => label)
            .increment(1);
        self.emit(TaskEvent::TaskFinished(kind, result));
    }
}

impl TaskRunner {
    pub fn new(
        tx: tokio::sync::mpsc::UnboundedSender<TaskEvent>,
        controller: DashboardController,
        exporter: CsvSnapshotExporter,
    ) -> Self {
        Self {
            inner: Arc::new(TaskRunnerInner {
                tx,
                controller: Arc::new(Mutex::new(controller)),
                exporter,
                refreshing: AtomicBool::new(false),
            }),
        }
    }

    pub fn add_ticker(&self, raw: String) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut controller = inner.controller.lock().await;
            let result = controller.add_ticker(&raw).await;
            if result.is_ok() {
                inner.emit(TaskEvent::View(view_of(&controller)));
            }
            drop(controller);
            inner.finish(
                TaskKind::AddTicker,
                result
                    .map(|added| format!("tracking {} at ${}", added.symbol, added.price))
                    .map_err(|err| err.to_string()),
            );
        });
    }

    /// Starts a refresh round unless one is already running.
    pub fn refresh(&self) -> bool {
        if self.inner.refreshing.swap(true, Ordering::AcqRel) {
            return false;
        }
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut controller = inner.controller.lock().await;
            let report = controller.refresh_all().await;
            inner.emit(TaskEvent::View(view_of(&controller)));
            drop(controller);
            inner.refreshing.store(false, Ordering::Release);
            if !report.updated.is_empty() || !report.skipped.is_empty() {
                inner.finish(
                    TaskKind::Refresh,
                    Ok(format!(
                        "refreshed {} ticker(s), {} skipped",
                        report.updated.len(),
                        report.skipped.len()
                    )),
                );
            }
        });
        true
    }

    pub fn chat(&self, input: String) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let reply = {
                let controller = inner.controller.lock().await;
                controller.chat_lookup(&input).await
            };
            if let Some(reply) = reply {
                inner.emit(TaskEvent::Chat(reply));
            }
        });
    }

    /// Selects the latest `window` samples of each ticker in `symbols` and sends them.
    pub fn send_selection(&self, symbols: Vec<Symbol>, window: usize) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut controller = inner.controller.lock().await;
            controller.select_latest(&symbols, window);
            let result = controller
                .send_selection()
                .await
                .map(|sent| format!("message sent ({} row(s))", sent.rows))
                .map_err(|err| err.to_string());
            drop(controller);
            inner.finish(TaskKind::Send, result);
        });
    }

    pub fn export(&self) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let result = {
                let controller = inner.controller.lock().await;
                controller.export_to(&inner.exporter)
            };
            inner.finish(
                TaskKind::Export,
                result.map(|out| format!("exported {} row(s) to {}", out.rows, out.path.display())),
            );
        });
    }
}
