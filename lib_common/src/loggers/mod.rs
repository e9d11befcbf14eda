/// Console and file logging through `fern`.
pub mod loggerlocal;

pub use loggerlocal::{parse_level, setup_logging};
