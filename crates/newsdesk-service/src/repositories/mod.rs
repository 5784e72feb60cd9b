mod news;
mod traits;

pub use news::{ACTIVE_POOL_SIZE, SqliteNewsRepository};
pub use traits::{FeedSection, NewsFeed, NewsRepository, ReviewVerdict, Viewer};
