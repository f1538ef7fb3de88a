pub mod browser_finder;
pub mod poll;

pub use poll::{wait_until, PollConfig};
