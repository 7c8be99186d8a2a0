use foundation::ids::RequestSeq;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The response belongs to the most recently issued request.
    Apply,
    /// A later request has been issued since; drop the response.
    Stale,
    /// This sequence is the one already applied, or was never issued.
    Duplicate,
}

/// Orders asynchronous responses by issue order instead of arrival order.
///
/// Every outgoing request takes a sequence from [`SequenceGate::issue`]. When
/// a response arrives, [`SequenceGate::admit`] decides whether it may touch
/// state: only the latest issued request is admitted, once.
#[derive(Debug, Clone, Default)]
pub struct SequenceGate {
    latest_issued: RequestSeq,
    last_applied: RequestSeq,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestSeq {
        self.latest_issued = self.latest_issued.next();
        self.latest_issued
    }

    pub fn latest_issued(&self) -> RequestSeq {
        self.latest_issued
    }

    pub fn last_applied(&self) -> RequestSeq {
        self.last_applied
    }

    /// True while the latest issued request has not been admitted.
    pub fn is_waiting(&self) -> bool {
        self.latest_issued > self.last_applied
    }

    pub fn admit(&mut self, seq: RequestSeq) -> Admission {
        if seq == RequestSeq::ZERO || seq > self.latest_issued || seq == self.last_applied {
            return Admission::Duplicate;
        }
        // Superseded, whether or not the newer response has landed yet.
        if seq < self.latest_issued {
            return Admission::Stale;
        }
        self.last_applied = seq;
        Admission::Apply
    }
}
