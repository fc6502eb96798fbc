// Domain models: live station rows, persisted aggregates, history views

mod aggregate;
mod history;
mod station;

pub use aggregate::AggregateRecord;
pub use history::{RecordOutcome, SnapshotHistory};
pub use station::StationSnapshot;
