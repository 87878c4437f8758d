pub mod catalog;
pub mod cli;
pub mod daemon;

pub use catalog::*;
pub use cli::*;
pub use daemon::*;
