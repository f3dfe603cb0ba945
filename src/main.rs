use log::LevelFilter;
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};

use pipesort::buffer::alloc_elems;
use pipesort::comm::PipelineComm;
use pipesort::data::worst_case;
use pipesort::error::SortError;
use pipesort::mpi_comm::MpiComm;
use pipesort::params::RunConfig;
use pipesort::pipeline::pipeline_sort;

fn main() {
    let _ = TermLogger::init(
        if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        },
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    let universe = mpi::initialize().unwrap();
    let mut comm = MpiComm::new(universe.world());

    let config = RunConfig::from_env();
    if let Err(err) = run(&mut comm, &config) {
        eprintln!("{}", err);
        // Exit without finalizing; the launcher tears down the peers
        std::process::exit(1);
    }
}

fn run(comm: &mut MpiComm, config: &RunConfig) -> Result<(), SortError> {
    let rank = comm.rank();
    let nprocs = comm.nprocs();
    config.validate(nprocs)?;

    let mut values = alloc_elems(rank, config.slice_len(rank, nprocs))?;
    worst_case(&mut values, config.total, nprocs, rank);

    let stats = pipeline_sort(comm, config, &mut values)?;

    if rank == 0 {
        println!("Array sorted in {}", stats.elapsed.as_secs_f64());
    }
    Ok(())
}
