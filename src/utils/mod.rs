pub mod logging;
pub mod normalize;

pub use normalize::normalize_cota;
