//! Distributed pipeline sort in Rust
//!
//! Sorts a sequence of 32-bit integers spread across a linear pipeline
//! of message-passing ranks. Each rank keeps its slice locally ordered
//! and trades border blocks with its neighbours until every boundary
//! satisfies `left.max <= right.min`, at which point the rank-order
//! concatenation of the slices is globally non-decreasing.
//!
//! The protocol only needs point-to-point sends, a probe, and a
//! one-to-all broadcast, captured by [`comm::PipelineComm`]. Real runs
//! use MPI (`--features mpi`); tests drive the same code over
//! channel-connected threads in one process.

/// Local ordering: the first-round sort and the run merges.
pub mod sort;

/// Round driver and the neighbour exchange protocol.
pub mod pipeline;

/// Transport trait and the in-process channel transport.
pub mod comm;

/// Preallocated per-rank buffers.
pub mod buffer;

/// Launch parameters and slice geometry.
pub mod params;

/// Error type shared across the crate.
pub mod error;

/// Input generation tools.
pub mod data;

/// MPI-backed transport.
#[cfg(feature = "mpi")]
pub mod mpi_comm;
