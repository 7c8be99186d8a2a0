//! Async driver that runs the controller's requests against an [`AssetsApi`].

use std::sync::Arc;

use catalog::Asset;
use foundation::ids::RequestSeq;
use foundation::time::Time;
use query::QueryResult;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::{ApiError, AssetsApi};
use crate::controller::{Applied, OutgoingQuery, SyncConfig, ViewportSyncController};
use crate::detail::{DetailOutcome, DetailRequest};
use crate::state::FilterState;
use crate::view::Viewport;

/// A finished request, tagged with the sequence it was issued under.
#[derive(Debug)]
pub enum Completion {
    Query {
        seq: RequestSeq,
        result: Result<QueryResult, ApiError>,
    },
    Detail {
        seq: RequestSeq,
        result: Result<Option<Asset>, ApiError>,
    },
}

/// What applying a [`Completion`] did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    Query { seq: RequestSeq, applied: Applied },
    QueryFailed { seq: RequestSeq },
    Detail { seq: RequestSeq, changed: bool },
}

/// Owns a [`ViewportSyncController`] and performs its requests.
///
/// Each outgoing request runs in its own task; completions come back over a
/// channel in whatever order they finish and are handed to the controller,
/// which decides by sequence whether they still apply.
pub struct ViewportSession<A: AssetsApi + 'static> {
    api: Arc<A>,
    controller: ViewportSyncController,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    started: Instant,
}

impl<A: AssetsApi + 'static> ViewportSession<A> {
    pub fn new(api: Arc<A>, config: SyncConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            controller: ViewportSyncController::new(config),
            tx,
            rx,
            in_flight: 0,
            started: Instant::now(),
        }
    }

    pub fn controller(&self) -> &ViewportSyncController {
        &self.controller
    }

    /// Milliseconds since the session started, on the tokio clock.
    pub fn now(&self) -> Time {
        let ms = self.started.elapsed().as_millis();
        Time::from_millis(u64::try_from(ms).unwrap_or(u64::MAX))
    }

    pub fn viewport_changed(&mut self, viewport: &Viewport) -> Option<RequestSeq> {
        let out = self.controller.on_viewport_change(viewport);
        self.spawn_query(out)
    }

    pub fn filters_changed(&mut self, filters: FilterState) -> Option<RequestSeq> {
        let out = self.controller.on_filters_change(filters);
        self.spawn_query(out)
    }

    pub fn clear_filters(&mut self) -> Option<RequestSeq> {
        let now = self.now();
        let out = self.controller.clear_filters(now);
        self.spawn_query(out)
    }

    pub fn search_input(&mut self, text: impl Into<String>) {
        let now = self.now();
        self.controller.on_search_input(text, now);
    }

    /// Releases a settled search, if any. Call at [`Self::next_deadline`].
    pub fn tick(&mut self) -> Option<RequestSeq> {
        let now = self.now();
        let out = self.controller.tick(now);
        self.spawn_query(out)
    }

    pub fn next_deadline(&self) -> Option<Time> {
        self.controller.next_deadline()
    }

    pub fn pointer_move(&mut self, feature: Option<&str>) {
        self.controller.set_hover(feature);
    }

    pub fn click(&mut self, feature: Option<&str>) -> Option<RequestSeq> {
        let req = self.controller.set_selected(feature)?;
        Some(self.spawn_detail(req))
    }

    pub fn clear_selection(&mut self) {
        self.controller.clear_selection();
    }

    /// Requests spawned whose completion has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Waits for the next request to finish and applies it. Returns `None`
    /// at once when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<SessionUpdate> {
        if self.in_flight == 0 {
            return None;
        }
        let completion = self.rx.recv().await?;
        Some(self.apply(completion))
    }

    /// Applies every completion that has already arrived.
    pub fn drain_ready(&mut self) -> Vec<SessionUpdate> {
        let mut out = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            out.push(self.apply(completion));
        }
        out
    }

    fn apply(&mut self, completion: Completion) -> SessionUpdate {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Query { seq, result: Ok(result) } => SessionUpdate::Query {
                seq,
                applied: self.controller.apply_query_result(seq, result),
            },
            Completion::Query { seq, result: Err(err) } => {
                self.controller.on_query_failed(seq, &err.to_string());
                SessionUpdate::QueryFailed { seq }
            }
            Completion::Detail { seq, result } => {
                let outcome = match result {
                    Ok(Some(asset)) => DetailOutcome::Found(asset),
                    Ok(None) => DetailOutcome::NotFound,
                    Err(err) => {
                        warn!(%seq, "asset detail lookup failed: {err}");
                        DetailOutcome::Failed(err.to_string())
                    }
                };
                SessionUpdate::Detail {
                    seq,
                    changed: self.controller.apply_detail(seq, outcome),
                }
            }
        }
    }

    fn spawn_query(&mut self, out: Option<OutgoingQuery>) -> Option<RequestSeq> {
        let OutgoingQuery { seq, params } = out?;
        self.in_flight += 1;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.list(params).await;
            if tx.send(Completion::Query { seq, result }).is_err() {
                debug!(%seq, "session dropped before query completed");
            }
        });
        Some(seq)
    }

    fn spawn_detail(&mut self, req: DetailRequest) -> RequestSeq {
        let DetailRequest { seq, id } = req;
        self.in_flight += 1;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.get(id).await;
            if tx.send(Completion::Detail { seq, result }).is_err() {
                debug!(%seq, "session dropped before detail lookup completed");
            }
        });
        seq
    }
}
