mod sorting;

use mpi::traits::Communicator;

use sorting::{test_pipeline_sort_worst_case, test_presorted_single_round};

fn main() {
    let universe = mpi::initialize().unwrap();
    let world = universe.world();
    let rank = world.rank();

    if rank == 0 {
        println!("Test pipeline sort: ");
    }
    test_pipeline_sort_worst_case(&universe);
    test_presorted_single_round(&universe);

    if rank == 0 {
        println!("ok");
    }
}
