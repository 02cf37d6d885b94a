pub mod media;
pub mod media_locator;
pub mod resume;
pub mod watch_history;
pub mod watchlist;

pub use media::{MediaRef, MediaType};
pub use media_locator::{LocatorParseError, MediaLocator};
pub use resume::{ResumePoint, ResumeProgress};
pub use watch_history::WatchHistoryEntry;
pub use watchlist::WatchLaterEntry;
