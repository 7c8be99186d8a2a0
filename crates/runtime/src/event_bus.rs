use foundation::ids::RequestSeq;
use tracing::debug;

/// One controller transition: the request it concerns and what happened
/// to it (`query.issued`, `query.applied`, `query.stale`, `query.failed`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub seq: RequestSeq,
    pub kind: &'static str,
    pub message: String,
}

/// Append-only log of controller transitions in the order they happened.
///
/// Each emit is also traced at `debug`, so a run with
/// `RUST_LOG=runtime=debug` shows the same sequence the log records.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, seq: RequestSeq, kind: &'static str, message: impl Into<String>) {
        let message = message.into();
        debug!(%seq, kind, "{message}");
        self.events.push(Event { seq, kind, message });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.kind).collect()
    }

    /// Events recorded for one request.
    pub fn for_seq(&self, seq: RequestSeq) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.seq == seq)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
