pub mod gesture;
pub mod link_queue;
pub mod screen_classifier;

pub use gesture::{GestureDriver, ScreenRegion, SwipeInsets};
pub use link_queue::LinkQueue;
pub use screen_classifier::{KeywordMatcher, ScreenClassifier};
