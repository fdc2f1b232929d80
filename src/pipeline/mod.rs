//! Pipeline entry points for the three subcommands

pub mod orchestrator;

pub use orchestrator::{
    print_classify_summary, print_compare_summary, print_sweep_summary, run_classify,
    run_compare, run_sweep, ClassifyResult, CompareResult, SweepResult,
};
