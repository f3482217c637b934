// ABOUTME: Backup orchestration: the run state machine and its outcome reporting
// ABOUTME: Everything here is I/O-free except through the SystemApi and WakeSignal seams

pub mod outcome;
pub mod run;

pub use outcome::{OutcomeCode, RunOutcome};
pub use run::{run_backup, Timing};
