pub mod prompt;
pub mod request;

pub use prompt::*;
pub use request::*;
