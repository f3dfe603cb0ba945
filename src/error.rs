use thiserror::Error;

/// Failures a rank can hit while setting up or running the sort.
///
/// Errors never cross the rank boundary. The rank that hits one reports
/// it and exits; tearing down the remaining ranks is left to the
/// message-passing runtime.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SortError {
    /// Buffer allocation failed on this rank. The protocol cannot run
    /// with a missing buffer, so this is fatal for the whole job.
    #[error("P{rank}: not enough memory to allocate array of length {elems}")]
    Allocation { rank: usize, elems: usize },

    /// A receive completed with the wrong element count.
    #[error("P{rank}: expected {expected} elements from P{peer}, got {got}")]
    ShortMessage {
        rank: usize,
        peer: usize,
        expected: usize,
        got: usize,
    },

    /// The channel to a neighbour is gone.
    #[error("P{rank}: link to P{peer} is down")]
    Disconnected { rank: usize, peer: usize },

    #[error("global length {total} is smaller than process count {nprocs}")]
    TotalTooSmall { total: usize, nprocs: usize },

    #[error("border divisor must be at least 2, got {divisor}")]
    BadDivisor { divisor: usize },

    /// A slice shorter than the divisor gets a zero-width border and can
    /// never trade elements with its neighbours, so the run could not
    /// make progress.
    #[error("slice length {slice_len} is smaller than border divisor {divisor}")]
    SliceTooThin { slice_len: usize, divisor: usize },

    #[error("P{rank}: slice has {got} elements, expected {expected}")]
    WrongSliceLen {
        rank: usize,
        expected: usize,
        got: usize,
    },
}
