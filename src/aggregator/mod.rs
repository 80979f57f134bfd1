pub mod controller;
pub mod fanout;

pub use controller::*;
pub use fanout::Session;
