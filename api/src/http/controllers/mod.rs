pub mod ask;
pub mod search;

pub use ask as AskController;
pub use search as SearchController;
