pub mod board;
pub mod history;
pub mod outcome;
pub mod stats;

pub use board::{Board, Section, Task, TaskHandle};
pub use history::{HistoryEntry, HistoryStatus};
pub use outcome::{CotaData, LanceOutcome, ProtocolRecord, ProtocolSource};
pub use stats::{CycleStats, TaskResult};
