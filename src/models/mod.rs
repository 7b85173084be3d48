pub mod category;
pub mod mode;
pub mod outcome;
pub mod ui;

pub use category::ContentCategory;
pub use mode::ParsingMode;
pub use outcome::RunOutcome;
pub use ui::{Bounds, Orientation, Selector};
