/// Identity of an issued request.
///
/// Sequences are handed out in strictly increasing order, so comparing two
/// sequences tells which request was issued later regardless of when their
/// responses arrive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestSeq(pub u64);

impl RequestSeq {
    /// Precedes every issued sequence.
    pub const ZERO: RequestSeq = RequestSeq(0);

    pub fn next(self) -> Self {
        RequestSeq(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
