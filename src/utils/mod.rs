pub mod crypto;
pub mod math;

pub use crypto::CryptoUtils;
pub use math::{MathUtils, LAMPORTS_PER_SOL};
