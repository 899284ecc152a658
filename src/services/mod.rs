pub mod board_extractor;
pub mod history;
pub mod lance_executor;
pub mod progress;
pub mod protocol_extractor;

pub use history::{FileHistorySink, HistorySink, NullHistorySink};
pub use progress::{LogReporter, NullReporter, ProgressReporter};
