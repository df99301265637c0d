mod constants;
mod fetch_part;
mod offset_writer;
mod part_ledger;
mod range_request;
mod spawn_tasks;

pub(super) use part_ledger::PartLedger;
pub(super) use spawn_tasks::{RunPartTasksParams, run_part_tasks};
