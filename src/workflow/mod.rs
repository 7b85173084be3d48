pub mod link_replay;
pub mod news_feed;
pub mod session;
pub mod session_ctx;
pub mod video_feed;

pub use link_replay::{LinkReplaySession, ReplayStats};
pub use news_feed::NewsFeedSession;
pub use session::{Session, SessionTools};
pub use session_ctx::SessionCtx;
pub use video_feed::VideoFeedSession;
