use std::time::Duration;

use catalog::Asset;
use foundation::bounds::GeoBounds;
use foundation::ids::RequestSeq;
use foundation::time::Time;
use query::{KindFilter, MAX_LIMIT, QueryParams, QueryResult, clamp_limit};
use runtime::debounce::{DEFAULT_QUIET_PERIOD, Debouncer};
use runtime::event_bus::EventBus;
use runtime::metrics::Metrics;
use runtime::sequence::{Admission, SequenceGate};
use tracing::warn;

use crate::detail::{DetailLookup, DetailOutcome, DetailRequest};
use crate::highlight::Highlight;
use crate::state::{ClientViewState, FetchStatus, FilterState};
use crate::view::Viewport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncConfig {
    /// Quiet period for search text before it is sent.
    pub search_quiet: Duration,
    /// Page size requested for the map layer.
    pub page_limit: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            search_quiet: DEFAULT_QUIET_PERIOD,
            page_limit: MAX_LIMIT,
        }
    }
}

/// A query the host must send, tagged with its issue sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingQuery {
    pub seq: RequestSeq,
    pub params: QueryParams,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Applied {
    Rendered,
    DiscardedStale,
}

/// Keeps the rendered asset set in step with the viewport and filters.
///
/// Viewport and dropdown/height changes issue a query immediately; search
/// text goes through a debouncer and is only issued from [`Self::tick`].
/// All parameters are combined into one query per change. A change that
/// leaves the combined parameters as they were issues nothing.
///
/// Ordering contract:
/// - Only the response to the most recently issued query is rendered.
/// - Responses are matched by sequence, never by arrival order.
#[derive(Debug)]
pub struct ViewportSyncController {
    config: SyncConfig,
    state: ClientViewState,
    search: Debouncer<String>,
    gate: SequenceGate,
    detail: DetailLookup,
    last_issued: Option<QueryParams>,
    last_failed: RequestSeq,
    resolved: u64,
    bus: EventBus,
    metrics: Metrics,
}

impl Default for ViewportSyncController {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl ViewportSyncController {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            state: ClientViewState::default(),
            search: Debouncer::new(config.search_quiet),
            gate: SequenceGate::new(),
            detail: DetailLookup::new(),
            last_issued: None,
            last_failed: RequestSeq::ZERO,
            resolved: 0,
            bus: EventBus::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn state(&self) -> &ClientViewState {
        &self.state
    }

    pub fn detail(&self) -> &DetailLookup {
        &self.detail
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// When the host should call [`Self::tick`] next, if a search is pending.
    pub fn next_deadline(&self) -> Option<Time> {
        self.search.deadline()
    }

    pub fn fetch_status(&self) -> FetchStatus {
        if self.gate.is_waiting() && self.last_failed != self.gate.latest_issued() {
            return FetchStatus::Fetching;
        }
        match &self.state.last_result {
            Some(r) => FetchStatus::Ready { total: r.total },
            None => FetchStatus::Idle,
        }
    }

    /// Parameters implied by the current state.
    pub fn current_params(&self) -> QueryParams {
        let s = &self.state;
        QueryParams {
            bbox: s.bbox.as_deref().and_then(|b| GeoBounds::parse(b).ok()),
            kind: s.filters.kind.map(KindFilter::Known),
            min_height: s.filters.min_height,
            max_height: s.filters.max_height,
            q: Some(s.debounced_q.clone()).filter(|q| !q.is_empty()),
            limit: clamp_limit(self.config.page_limit as f64),
            offset: 0,
        }
    }

    // --- query transitions -------------------------------------------------

    pub fn on_viewport_change(&mut self, viewport: &Viewport) -> Option<OutgoingQuery> {
        self.state.bbox = viewport.bbox_param();
        self.issue_if_changed("viewport")
    }

    pub fn on_filters_change(&mut self, filters: FilterState) -> Option<OutgoingQuery> {
        self.state.filters = filters;
        self.issue_if_changed("filters")
    }

    /// Records a keystroke. Nothing is issued until the quiet period passes.
    pub fn on_search_input(&mut self, text: impl Into<String>, now: Time) {
        let text = text.into();
        self.state.search_text = text.clone();
        self.search.arm(text, now);
    }

    pub fn tick(&mut self, now: Time) -> Option<OutgoingQuery> {
        let q = self.search.poll(now)?;
        self.state.debounced_q = q;
        self.issue_if_changed("search")
    }

    /// Resets type and height filters at once and the search text through
    /// the debouncer.
    pub fn clear_filters(&mut self, now: Time) -> Option<OutgoingQuery> {
        self.on_search_input(String::new(), now);
        let mut filters = self.state.filters.clone();
        filters.clear();
        self.on_filters_change(filters)
    }

    pub fn apply_query_result(&mut self, seq: RequestSeq, result: QueryResult) -> Applied {
        let admission = self.gate.admit(seq);
        if admission != Admission::Duplicate {
            self.resolved += 1;
            self.update_inflight();
        }

        if admission != Admission::Apply {
            self.metrics.incr("queries.stale");
            self.bus.emit(
                seq,
                "query.stale",
                format!("latest={} total={}", self.gate.latest_issued(), result.total),
            );
            return Applied::DiscardedStale;
        }

        self.metrics.incr("queries.applied");
        self.metrics.record("result.total", result.total as u64);
        self.bus.emit(
            seq,
            "query.applied",
            format!("items={} total={}", result.items.len(), result.total),
        );
        self.state.last_result = Some(result);
        self.state.last_applied_seq = seq;
        Applied::Rendered
    }

    /// A query failed in transport. The previous result stays rendered.
    pub fn on_query_failed(&mut self, seq: RequestSeq, message: &str) {
        warn!(%seq, "asset query failed: {message}");
        self.metrics.incr("queries.failed");
        self.bus.emit(seq, "query.failed", message);
        if seq == self.gate.latest_issued() {
            self.last_failed = seq;
            // Same parameters must be sendable again.
            self.last_issued = None;
        }
        if seq <= self.gate.latest_issued() {
            self.resolved += 1;
            self.update_inflight();
        }
    }

    // --- pointer transitions ----------------------------------------------

    /// Feature under the pointer, if any.
    pub fn set_hover(&mut self, feature: Option<&str>) {
        self.state.highlight.pointer_move(feature);
    }

    /// Click on the map. Returns the detail lookup to perform, if any.
    pub fn set_selected(&mut self, feature: Option<&str>) -> Option<DetailRequest> {
        self.state.highlight.click(feature);
        self.detail.select(self.state.highlight.selected_id())
    }

    pub fn clear_selection(&mut self) {
        self.state.highlight.clear_selection();
        self.detail.clear();
    }

    pub fn apply_detail(&mut self, seq: RequestSeq, outcome: DetailOutcome) -> bool {
        self.detail.resolve(seq, outcome)
    }

    pub fn highlight_for(&self, id: &str) -> Highlight {
        self.state.highlight.highlight_for(id)
    }

    /// Rendered features with their highlight, in result order.
    pub fn rendered_features(&self) -> Vec<(&Asset, Highlight)> {
        let Some(result) = &self.state.last_result else {
            return Vec::new();
        };
        result
            .items
            .iter()
            .map(|a| (a, self.highlight_for(&a.id)))
            .collect()
    }

    fn issue_if_changed(&mut self, cause: &'static str) -> Option<OutgoingQuery> {
        let params = self.current_params();
        if self.last_issued.as_ref() == Some(&params) {
            return None;
        }

        let seq = self.gate.issue();
        self.metrics.incr("queries.issued");
        self.update_inflight();
        self.bus.emit(
            seq,
            "query.issued",
            format!(
                "cause={cause} bbox={}",
                self.state.bbox.as_deref().unwrap_or("-")
            ),
        );
        self.last_issued = Some(params.clone());
        Some(OutgoingQuery { seq, params })
    }

    fn update_inflight(&mut self) {
        let issued = self.gate.latest_issued().get();
        let inflight = issued.saturating_sub(self.resolved);
        self.metrics
            .set_gauge("queries.inflight", i64::try_from(inflight).unwrap_or(i64::MAX));
    }
}

#[cfg(test)]
mod tests {
    use super::{Applied, SyncConfig, ViewportSyncController};
    use crate::detail::{DetailOutcome, DetailView};
    use crate::highlight::Highlight;
    use crate::state::{FetchStatus, FilterState};
    use crate::view::Viewport;
    use catalog::{Asset, AssetKind};
    use foundation::time::Time;
    use pretty_assertions::assert_eq;
    use query::{KindFilter, QueryResult, query};
    use std::time::Duration;

    fn alpha_beta() -> Vec<Asset> {
        vec![
            Asset {
                id: "1".into(),
                name: "Alpha".into(),
                kind: AssetKind::Building,
                height: Some(50.0),
                centroid: [10.0, 10.0],
            },
            Asset {
                id: "2".into(),
                name: "Beta".into(),
                kind: AssetKind::Road,
                height: None,
                centroid: [20.0, 20.0],
            },
        ]
    }

    fn near(lon: f64, lat: f64) -> Viewport {
        Viewport::from_lon_lat_zoom(lon, lat, 8.0, 256, 256)
    }

    #[test]
    fn viewport_change_issues_immediately() {
        let mut c = ViewportSyncController::default();
        let out = c.on_viewport_change(&near(10.0, 10.0)).unwrap();
        assert_eq!(out.seq.get(), 1);
        assert!(out.params.bbox.unwrap().contains(10.0, 10.0));
        assert_eq!(out.params.limit, 1000);
        assert_eq!(c.fetch_status(), FetchStatus::Fetching);
    }

    #[test]
    fn unchanged_params_issue_nothing() {
        let mut c = ViewportSyncController::default();
        assert!(c.on_viewport_change(&near(10.0, 10.0)).is_some());
        assert!(c.on_viewport_change(&near(10.0, 10.0)).is_none());
        assert!(c.on_filters_change(FilterState::default()).is_none());
    }

    #[test]
    fn filters_are_combined_with_viewport() {
        let mut c = ViewportSyncController::default();
        c.on_viewport_change(&near(10.0, 10.0));
        let out = c
            .on_filters_change(FilterState {
                kind: Some(AssetKind::Road),
                min_height: Some(3.0),
                max_height: None,
            })
            .unwrap();
        assert!(out.params.bbox.is_some());
        assert_eq!(out.params.kind, Some(KindFilter::Known(AssetKind::Road)));
        assert_eq!(out.params.min_height, Some(3.0));
        assert_eq!(out.seq.get(), 2);
    }

    #[test]
    fn search_is_debounced() {
        let mut c = ViewportSyncController::default();
        c.on_search_input("a", Time(0));
        c.on_search_input("al", Time(120));
        c.on_search_input("alp", Time(250));
        assert_eq!(c.state().search_text, "alp");
        assert_eq!(c.next_deadline(), Some(Time(550)));

        assert!(c.tick(Time(400)).is_none());
        assert_eq!(c.state().debounced_q, "");

        let out = c.tick(Time(550)).unwrap();
        assert_eq!(out.params.q.as_deref(), Some("alp"));
        assert_eq!(c.events().kinds(), vec!["query.issued"]);
        assert!(c.tick(Time(10_000)).is_none());
    }

    #[test]
    fn typing_back_to_same_text_issues_nothing() {
        let mut c = ViewportSyncController::default();
        c.on_search_input("beta", Time(0));
        assert!(c.tick(Time(300)).is_some());
        c.on_search_input("bet", Time(400));
        c.on_search_input("beta", Time(500));
        assert!(c.tick(Time(800)).is_none());
    }

    #[test]
    fn custom_quiet_period() {
        let mut c = ViewportSyncController::new(SyncConfig {
            search_quiet: Duration::from_millis(50),
            page_limit: 5000,
        });
        c.on_search_input("x", Time(0));
        let out = c.tick(Time(50)).unwrap();
        assert_eq!(out.params.limit, 1000);
    }

    #[test]
    fn late_response_from_superseded_query_is_discarded() {
        let assets = alpha_beta();
        let mut c = ViewportSyncController::default();

        let first = c.on_viewport_change(&near(10.0, 10.0)).unwrap();
        let second = c.on_viewport_change(&near(20.0, 20.0)).unwrap();

        let second_result = query(assets.as_slice(), &second.params);
        let first_result = query(assets.as_slice(), &first.params);

        assert_eq!(c.apply_query_result(second.seq, second_result), Applied::Rendered);
        assert_eq!(
            c.apply_query_result(first.seq, first_result),
            Applied::DiscardedStale
        );

        let shown: Vec<&str> = c
            .rendered_features()
            .iter()
            .map(|(a, _)| a.id.as_str())
            .collect();
        assert_eq!(shown, vec!["2"]);
        assert_eq!(c.state().last_applied_seq, second.seq);
        assert_eq!(c.fetch_status(), FetchStatus::Ready { total: 1 });
        assert_eq!(c.metrics().counter("queries.stale"), 1);
        assert_eq!(c.metrics().gauge("queries.inflight"), Some(0));
    }

    #[test]
    fn early_response_from_superseded_query_is_discarded() {
        let mut c = ViewportSyncController::default();
        let first = c.on_viewport_change(&near(10.0, 10.0)).unwrap();
        let second = c.on_viewport_change(&near(20.0, 20.0)).unwrap();

        let stale = QueryResult {
            items: vec![],
            total: 99,
        };
        assert_eq!(c.apply_query_result(first.seq, stale), Applied::DiscardedStale);
        assert!(c.state().last_result.is_none());
        assert_eq!(c.fetch_status(), FetchStatus::Fetching);

        c.apply_query_result(second.seq, QueryResult::default());
        assert_eq!(c.fetch_status(), FetchStatus::Ready { total: 0 });
        assert_eq!(
            c.events().kinds(),
            vec!["query.issued", "query.issued", "query.stale", "query.applied"]
        );
    }

    #[test]
    fn selection_survives_pan_out_of_page() {
        let assets = alpha_beta();
        let mut c = ViewportSyncController::default();

        let q = c.on_viewport_change(&near(10.0, 10.0)).unwrap();
        c.apply_query_result(q.seq, query(assets.as_slice(), &q.params));
        let detail = c.set_selected(Some("1")).unwrap();
        assert_eq!(detail.id, "1");

        let q = c.on_viewport_change(&near(20.0, 20.0)).unwrap();
        c.apply_query_result(q.seq, query(assets.as_slice(), &q.params));

        assert!(c.rendered_features().iter().all(|(a, _)| a.id != "1"));
        assert_eq!(c.state().selected_id(), Some("1"));
        assert_eq!(c.highlight_for("1"), Highlight::Selected);

        // The detail lookup is not gated by the rendered page.
        assert!(c.apply_detail(detail.seq, DetailOutcome::Found(assets[0].clone())));
        assert!(matches!(c.detail().view(), DetailView::Record(_)));

        c.set_selected(None);
        assert_eq!(c.state().selected_id(), None);
        assert_eq!(c.detail().view(), DetailView::NoSelection);
    }

    #[test]
    fn rendered_features_carry_highlight() {
        let assets = alpha_beta();
        let mut c = ViewportSyncController::default();
        let q = c
            .on_viewport_change(&Viewport::from_lon_lat_zoom(15.0, 15.0, 3.0, 512, 512))
            .unwrap();
        c.apply_query_result(q.seq, query(assets.as_slice(), &q.params));
        c.set_hover(Some("2"));
        c.set_selected(Some("1"));

        let got: Vec<(&str, Highlight)> = c
            .rendered_features()
            .into_iter()
            .map(|(a, h)| (a.id.as_str(), h))
            .collect();
        assert_eq!(got, vec![("1", Highlight::Selected), ("2", Highlight::Hovered)]);
    }

    #[test]
    fn clear_filters_resets_immediately_and_search_later() {
        let mut c = ViewportSyncController::default();
        c.on_filters_change(FilterState {
            kind: Some(AssetKind::Poi),
            ..Default::default()
        });
        c.on_search_input("cafe", Time(0));
        c.tick(Time(300)).unwrap();

        let out = c.clear_filters(Time(1_000)).unwrap();
        assert_eq!(out.params.kind, None);
        assert_eq!(out.params.q.as_deref(), Some("cafe"));

        let out = c.tick(Time(1_300)).unwrap();
        assert_eq!(out.params.q, None);
        assert_eq!(c.state().search_text, "");
    }

    #[test]
    fn failed_query_keeps_previous_result() {
        let mut c = ViewportSyncController::default();
        let q = c.on_viewport_change(&near(10.0, 10.0)).unwrap();
        c.apply_query_result(
            q.seq,
            QueryResult {
                items: vec![],
                total: 4,
            },
        );
        let q = c.on_viewport_change(&near(11.0, 11.0)).unwrap();
        c.on_query_failed(q.seq, "connection reset");

        assert_eq!(c.state().last_result.as_ref().map(|r| r.total), Some(4));
        assert_eq!(c.metrics().counter("queries.failed"), 1);
        assert_eq!(c.metrics().gauge("queries.inflight"), Some(0));
        assert_eq!(c.fetch_status(), FetchStatus::Ready { total: 4 });
    }

    #[test]
    fn same_viewport_is_retried_after_failure() {
        let mut c = ViewportSyncController::default();
        let v = near(10.0, 10.0);
        let q = c.on_viewport_change(&v).unwrap();
        c.on_query_failed(q.seq, "timeout");
        assert_eq!(c.fetch_status(), FetchStatus::Idle);

        let retry = c.on_viewport_change(&v).unwrap();
        assert!(retry.seq > q.seq);
        assert_eq!(retry.params, q.params);
        assert_eq!(c.fetch_status(), FetchStatus::Fetching);
    }

    #[test]
    fn same_search_is_retried_after_failure() {
        let mut c = ViewportSyncController::default();
        c.on_search_input("alp", Time(0));
        let q = c.tick(Time(300)).unwrap();
        c.on_query_failed(q.seq, "timeout");

        c.on_search_input("al", Time(400));
        c.on_search_input("alp", Time(450));
        let retry = c.tick(Time(750)).unwrap();
        assert_eq!(retry.params.q.as_deref(), Some("alp"));
    }

    #[test]
    fn failure_of_superseded_query_keeps_dedup() {
        let mut c = ViewportSyncController::default();
        let first = c.on_viewport_change(&near(10.0, 10.0)).unwrap();
        c.on_viewport_change(&near(20.0, 20.0)).unwrap();
        c.on_query_failed(first.seq, "timeout");
        assert!(c.on_viewport_change(&near(20.0, 20.0)).is_none());
    }

    #[test]
    fn clear_selection_drops_pending_detail() {
        let mut c = ViewportSyncController::default();
        let req = c.set_selected(Some("1")).unwrap();
        c.clear_selection();
        assert_eq!(c.state().selected_id(), None);
        assert!(!c.apply_detail(req.seq, DetailOutcome::NotFound));
        assert_eq!(c.detail().view(), DetailView::NoSelection);
    }

    #[test]
    fn stale_events_are_traced_per_request() {
        let mut c = ViewportSyncController::default();
        let first = c.on_viewport_change(&near(10.0, 10.0)).unwrap();
        let second = c.on_viewport_change(&near(20.0, 20.0)).unwrap();
        c.apply_query_result(second.seq, QueryResult::default());
        c.apply_query_result(first.seq, QueryResult::default());

        let kinds: Vec<&str> = c.events().for_seq(first.seq).map(|e| e.kind).collect();
        assert_eq!(kinds, vec!["query.issued", "query.stale"]);
        assert_eq!(c.metrics().gauge("queries.inflight"), Some(0));
    }
}
