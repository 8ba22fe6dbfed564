pub mod coin_syncer;
pub mod data_syncer;

pub use coin_syncer::{CoinSyncer, SyncOutcome};
pub use data_syncer::DataSyncer;
