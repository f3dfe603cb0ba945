//! The round driver and the six-phase neighbour exchange protocol.
//!
//! Per round: re-establish local order, advertise the top border value
//! to the right, test the boundary predicate against the left, agree
//! on completion with every rank, then trade borders across each
//! boundary that is still out of order. The loop runs until every
//! boundary satisfies `left.max <= right.min`, at which point the
//! rank-order concatenation of all slices is non-decreasing.

use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::buffer::Scratch;
use crate::comm::PipelineComm;
use crate::error::SortError;
use crate::params::RunConfig;
use crate::sort::{bubblesort, is_sorted, merge_2, merge_3};

/// What a completed run looked like from one rank.
#[derive(Debug, Clone, Copy)]
pub struct SortStats {
    /// Driver iterations until the agreement phase reported done.
    /// Identical on every rank.
    pub rounds: usize,
    /// Border shipments and border merges this rank performed. Zero on
    /// every rank when the input was already globally sorted.
    pub exchanges: usize,
    /// Wall time from entering the loop to agreement.
    pub elapsed: Duration,
}

/// Everything one rank mutates across rounds. A plain record rather
/// than process-global state, so a test harness can hold one per
/// logical rank in a single address space.
struct RankState {
    rank: usize,
    nprocs: usize,
    slice_len: usize,
    /// Border width of this slice.
    border: usize,
    scratch: Scratch,
    /// The next local reorder is the initial full sort.
    first_sort: bool,
    /// Element count of the right neighbour's border shipment, learned
    /// by probing the first one. Structurally constant afterwards.
    recv_count: Option<usize>,
    exchanges: usize,
}

impl RankState {
    fn new(config: &RunConfig, rank: usize, nprocs: usize) -> Result<Self, SortError> {
        Ok(RankState {
            rank,
            nprocs,
            slice_len: config.slice_len(rank, nprocs),
            border: config.border_len(rank, nprocs),
            scratch: Scratch::alloc(rank, nprocs, config)?,
            first_sort: true,
            recv_count: None,
            exchanges: 0,
        })
    }
}

/// Sort the distributed sequence whose local slice is `values`.
///
/// Must be entered by every rank of `comm` with the same `config`.
/// On return the slice is non-decreasing, the concatenation of all
/// slices in rank order is non-decreasing, and the global multiset of
/// elements is unchanged.
///
/// # Arguments
/// `comm` - Transport connecting this rank to its pipeline
/// `config` - Launch parameters, identical on every rank
/// `values` - This rank's slice, exactly `config.slice_len` elements
pub fn pipeline_sort<C: PipelineComm>(
    comm: &mut C,
    config: &RunConfig,
    values: &mut [i32],
) -> Result<SortStats, SortError> {
    let rank = comm.rank();
    let nprocs = comm.nprocs();
    config.validate(nprocs)?;

    let expected = config.slice_len(rank, nprocs);
    if values.len() != expected {
        return Err(SortError::WrongSliceLen {
            rank,
            expected,
            got: values.len(),
        });
    }

    let mut state = RankState::new(config, rank, nprocs)?;
    let start = Instant::now();
    let mut rounds = 0;

    loop {
        rounds += 1;
        trace!("P{}: round {} begins", rank, rounds);

        local_order(&mut state, config, values);
        advertise_border(comm, &state, values)?;
        let local_sorted = left_boundary_sorted(comm, &state, values)?;
        state.scratch.sorted[rank] = local_sorted as u8;

        if agree_on_completion(comm, config, &mut state)? {
            break;
        }
        exchange_borders(comm, config, &mut state, values)?;
    }

    debug!("P{}: done after {} rounds", rank, rounds);
    Ok(SortStats {
        rounds,
        exchanges: state.exchanges,
        elapsed: start.elapsed(),
    })
}

/// The first round sorts the raw slice; afterwards the slice is three
/// sorted runs (reintegrated left border, untouched middle, merged
/// right border) and a three-way merge rebuilds total order.
fn local_order(state: &mut RankState, config: &RunConfig, values: &mut [i32]) {
    if state.first_sort || !config.prefer_merge {
        bubblesort(values);
        state.first_sort = false;
    } else {
        let b = state.border;
        let s = state.slice_len;
        let dst = &mut state.scratch.combined[..s];
        {
            let (head, rest) = values.split_at(b);
            let (mid, tail) = rest.split_at(s - 2 * b);
            merge_3(head, mid, tail, dst);
        }
        values.copy_from_slice(dst);
    }
    debug_assert!(is_sorted(values));
}

/// Tell the right neighbour the largest value held here.
fn advertise_border<C: PipelineComm>(
    comm: &mut C,
    state: &RankState,
    values: &[i32],
) -> Result<(), SortError> {
    if state.rank + 1 < state.nprocs {
        comm.send(state.rank + 1, &values[state.slice_len - 1..])?;
    }
    Ok(())
}

/// The boundary with the left neighbour is sorted when nothing here is
/// smaller than anything there. Rank 0 has no left neighbour and is
/// always sorted on that side.
fn left_boundary_sorted<C: PipelineComm>(
    comm: &mut C,
    state: &RankState,
    values: &[i32],
) -> Result<bool, SortError> {
    if state.rank == 0 {
        return Ok(true);
    }
    let mut biggest = [0i32];
    comm.recv_into(state.rank - 1, &mut biggest)?;
    trace!(
        "P{}: left max {} vs local min {}",
        state.rank,
        biggest[0],
        values[0]
    );
    Ok(values[0] >= biggest[0])
}

/// Each rank in turn broadcasts its boundary flag; the run is over
/// once every boundary reports sorted. In full-converge mode all flags
/// are published so the exchange can skip settled boundaries;
/// otherwise the loop stops at the first unsorted boundary and every
/// rank exchanges unconditionally.
fn agree_on_completion<C: PipelineComm>(
    comm: &mut C,
    config: &RunConfig,
    state: &mut RankState,
) -> Result<bool, SortError> {
    let mut finished = true;
    for root in 1..state.nprocs {
        let mut flag = state.scratch.sorted[root];
        comm.broadcast(root, &mut flag)?;
        state.scratch.sorted[root] = flag;
        finished = finished && flag != 0;
        if !config.full_converge && !finished {
            break;
        }
    }
    Ok(finished)
}

/// The half-exchange across each unsettled boundary.
///
/// The lower border goes left, the left side merges it with its own
/// upper border, keeps the smaller half and returns the larger half,
/// which lands back where the lower border was. Both sides run this
/// from the same broadcast flags, so the sends and receives pair up
/// without a cycle.
fn exchange_borders<C: PipelineComm>(
    comm: &mut C,
    config: &RunConfig,
    state: &mut RankState,
    values: &mut [i32],
) -> Result<(), SortError> {
    let rank = state.rank;
    let b = state.border;
    let s = state.slice_len;

    // In full-converge mode a settled boundary sits the round out; the
    // flags are identical on both of its sides.
    let left_active = rank > 0 && (!config.full_converge || state.scratch.sorted[rank] == 0);
    let right_active = rank + 1 < state.nprocs
        && (!config.full_converge || state.scratch.sorted[rank + 1] == 0);

    if left_active {
        comm.send(rank - 1, &values[..b])?;
        state.exchanges += 1;
        trace!("P{}: shipped {} border values left", rank, b);
    }

    if right_active {
        // The shipment width is the peer's border, constant for the
        // whole run; learn it from the first message.
        let count = match state.recv_count {
            Some(count) => count,
            None => {
                let count = comm.probe(rank + 1)?;
                state.recv_count = Some(count);
                count
            }
        };
        comm.recv_into(rank + 1, &mut state.scratch.right_val[..count])?;

        let total = b + count;
        merge_2(
            &values[s - b..],
            &state.scratch.right_val[..count],
            &mut state.scratch.combined[..total],
        );

        // Smaller half of the union stays as the new upper border, the
        // larger half belongs further right.
        values[s - b..].copy_from_slice(&state.scratch.combined[..b]);
        comm.send(rank + 1, &state.scratch.combined[b..total])?;
        state.exchanges += 1;
        trace!("P{}: merged {} values from the right", rank, count);
    }

    if left_active {
        // The values coming back are at least as large as everything
        // the left neighbour kept.
        comm.recv_into(rank - 1, &mut values[..b])?;
    }

    Ok(())
}
