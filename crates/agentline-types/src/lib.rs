pub mod entry;
pub mod error;
pub mod log_msg;
mod util;

pub use entry::*;
pub use error::{Error, Result};
pub use log_msg::*;
pub use util::*;
