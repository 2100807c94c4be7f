pub mod logging;
pub mod phase;

pub use logging::*;
pub use phase::*;
