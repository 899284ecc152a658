pub mod lance_flow;
pub mod task_ctx;

pub use lance_flow::LanceFlow;
pub use task_ctx::TaskCtx;
