pub mod cycle;

pub use cycle::{CancelFlag, CycleOrchestrator};
