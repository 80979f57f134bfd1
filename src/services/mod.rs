pub mod interface;
pub mod solana;
pub mod coingecko;
pub mod metadata;

pub use interface::{MetadataResolver, NetworkClient, PriceClient, QueryError};
pub use solana::{RpcNetworkClient, SolanaNetwork};
pub use coingecko::CoinGeckoPriceClient;
pub use metadata::StaticMetadataResolver;
