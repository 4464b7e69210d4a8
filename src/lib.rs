pub mod cli;
pub mod config;
pub mod error;
pub mod transfer;
pub mod util;

pub use error::MirrorError;
pub use error::Stage;
