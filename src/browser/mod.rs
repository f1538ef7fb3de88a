pub mod driver;
pub mod session;
pub mod stealth;

pub use driver::PageDriver;
pub use session::{BrowserSession, LaunchOptions};
pub use stealth::StealthProfile;
