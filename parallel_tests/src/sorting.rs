use mpi::environment::Universe;
use mpi::traits::{Communicator, Destination, Source};

use pipesort::comm::PipelineComm;
use pipesort::data::worst_case;
use pipesort::mpi_comm::MpiComm;
use pipesort::params::RunConfig;
use pipesort::pipeline::pipeline_sort;
use pipesort::sort::is_sorted;

// Test the full protocol on the reversed worst-case input
pub fn test_pipeline_sort_worst_case(universe: &Universe) {
    let world = universe.world();
    let rank = world.rank();
    let size = world.size();

    let config = RunConfig {
        total: 4096,
        divisor: 2,
        prefer_merge: true,
        full_converge: true,
    };

    if rank == 0 {
        println!(
            "Test worst-case sort with {} values across {} processes",
            config.total, size
        );
    }

    let mut comm = MpiComm::new(universe.world());
    let nprocs = comm.nprocs();
    let mut values = vec![0i32; config.slice_len(rank as usize, nprocs)];
    worst_case(&mut values, config.total, nprocs, rank as usize);

    let stats = pipeline_sort(&mut comm, &config, &mut values).unwrap();

    // Test that the slice is sorted on this process
    assert!(is_sorted(&values));

    // Test that the minimum on this process is at least the maximum on
    // the previous process
    if rank > 0 {
        let min = *values.first().unwrap();
        world.process_at_rank(rank - 1).send(&min);
    }
    if rank < size - 1 {
        let (rec, _) = world.process_at_rank(rank + 1).receive::<i32>();
        let max = *values.last().unwrap();
        assert!(max <= rec);
    }

    if rank == 0 {
        println!("sorted in {} rounds", stats.rounds);
    }
}

// An already sorted distribution must settle in a single round with no
// border traffic
pub fn test_presorted_single_round(universe: &Universe) {
    let world = universe.world();
    let rank = world.rank();
    let size = world.size();

    let config = RunConfig {
        total: 4096,
        divisor: 2,
        prefer_merge: true,
        full_converge: true,
    };

    if rank == 0 {
        println!(
            "Test presorted input with {} values across {} processes",
            config.total, size
        );
    }

    let mut comm = MpiComm::new(universe.world());
    let nprocs = comm.nprocs();
    let slice_len = config.slice_len(rank as usize, nprocs);
    let offset = (config.total / nprocs) * rank as usize;
    let mut values: Vec<i32> = (0..slice_len).map(|i| (offset + i) as i32).collect();

    let stats = pipeline_sort(&mut comm, &config, &mut values).unwrap();

    assert_eq!(stats.rounds, 1);
    assert_eq!(stats.exchanges, 0);
    assert!(is_sorted(&values));
}
