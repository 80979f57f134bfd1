pub mod wallet;
pub mod token;
pub mod display;

pub use wallet::*;
pub use token::*;
pub use display::*;
