pub mod comment;
pub mod recipe;
pub mod session;

pub use comment::*;
pub use recipe::*;
pub use session::*;
