pub mod booking;
pub mod browser;
pub mod probe;
pub mod utils;

// Re-export common items
pub use booking::{BookingOutcome, BookingRunner};
pub use browser::{BrowserSession, StealthProfile};
