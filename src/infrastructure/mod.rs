pub mod session;
pub mod waits;

pub use session::Session;
