use crate::core::notify::Broadcaster;
use crate::core::provider::{BlockchainResponse, CoinResponse, TokenResponse};
use crate::core::{
    AddressType, Blockchain, BlockchainType, CatalogStamps, Coin, Derivation, MarketDataProvider,
    Result, Storage, SyncInfo, TokenEntity, TokenType,
};
use futures::future::join3;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, instrument};

const KEY_COINS_LAST_SYNC: &str = "coin-syncer-coins-last-sync-timestamp";
const KEY_BLOCKCHAINS_LAST_SYNC: &str = "coin-syncer-blockchains-last-sync-timestamp";
const KEY_TOKENS_LAST_SYNC: &str = "coin-syncer-tokens-last-sync-timestamp";

/// Blockchains whose single generic token is split into one token per variant.
const EXPANDED_BLOCKCHAINS: [BlockchainType; 3] = [
    BlockchainType::Bitcoin,
    BlockchainType::Litecoin,
    BlockchainType::BitcoinCash,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    UpToDate,
    Updated,
    Failed,
}

/// Mirrors the remote coin/blockchain/token catalog into storage.
pub struct CoinSyncer {
    provider: Arc<dyn MarketDataProvider>,
    storage: Arc<dyn Storage>,
    updates: Broadcaster<()>,
    in_flight: Mutex<()>,
}

impl CoinSyncer {
    pub fn new(provider: Arc<dyn MarketDataProvider>, storage: Arc<dyn Storage>) -> Self {
        Self {
            provider,
            storage,
            updates: Broadcaster::new(),
            in_flight: Mutex::new(()),
        }
    }

    /// Receives `()` each time the stored catalog is replaced.
    pub fn full_coins_updated(&self) -> UnboundedReceiver<()> {
        self.updates.subscribe()
    }

    /// Refetches the catalog when any stamp differs from the persisted one.
    ///
    /// Overlapping calls are serialized; a call that waited on another sync
    /// re-reads the stamps and becomes a no-op if that sync already applied
    /// them. Failures are logged and leave the stamps untouched.
    #[instrument(name = "CoinSync", skip(self))]
    pub async fn sync(&self, stamps: CatalogStamps) -> SyncOutcome {
        let _guard = self.in_flight.lock().await;

        match self.is_outdated(&stamps) {
            Ok(false) => {
                debug!("Catalog is up to date");
                return SyncOutcome::UpToDate;
            }
            Ok(true) => {}
            Err(e) => {
                error!(error = %e, "Failed to read sync state");
                return SyncOutcome::Failed;
            }
        }

        match self.fetch_and_store(stamps).await {
            Ok(()) => {
                info!("Catalog synced");
                SyncOutcome::Updated
            }
            Err(e) => {
                error!(error = %e, "Catalog sync failed");
                SyncOutcome::Failed
            }
        }
    }

    pub fn sync_info(&self) -> Result<SyncInfo> {
        Ok(SyncInfo {
            coins_timestamp: self.storage.sync_state(KEY_COINS_LAST_SYNC)?,
            blockchains_timestamp: self.storage.sync_state(KEY_BLOCKCHAINS_LAST_SYNC)?,
            tokens_timestamp: self.storage.sync_state(KEY_TOKENS_LAST_SYNC)?,
        })
    }

    fn last_stamp(&self, key: &str) -> Result<i64> {
        Ok(self
            .storage
            .sync_state(key)?
            .and_then(|value| value.parse().ok())
            .unwrap_or(0))
    }

    fn is_outdated(&self, stamps: &CatalogStamps) -> Result<bool> {
        Ok(self.last_stamp(KEY_COINS_LAST_SYNC)? != stamps.coins
            || self.last_stamp(KEY_BLOCKCHAINS_LAST_SYNC)? != stamps.blockchains
            || self.last_stamp(KEY_TOKENS_LAST_SYNC)? != stamps.tokens)
    }

    async fn fetch_and_store(&self, stamps: CatalogStamps) -> Result<()> {
        // All three legs run to completion even if one of them fails.
        let (coins, blockchains, tokens) = join3(
            self.provider.fetch_coins(),
            self.provider.fetch_blockchains(),
            self.provider.fetch_tokens(),
        )
        .await;

        let coins: Vec<Coin> = coins?.into_iter().map(coin_entity).collect();
        let blockchains: Vec<Blockchain> =
            blockchains?.into_iter().map(blockchain_entity).collect();
        let tokens = expand_tokens(tokens?.into_iter().map(token_entity).collect());

        debug!(
            coins = coins.len(),
            blockchains = blockchains.len(),
            tokens = tokens.len(),
            "Fetched catalog"
        );

        self.storage.replace_catalog(&coins, &blockchains, &tokens)?;
        self.save_stamps(&stamps)?;
        self.updates.emit(());
        Ok(())
    }

    fn save_stamps(&self, stamps: &CatalogStamps) -> Result<()> {
        self.storage
            .save_sync_state(KEY_COINS_LAST_SYNC, &stamps.coins.to_string())?;
        self.storage
            .save_sync_state(KEY_BLOCKCHAINS_LAST_SYNC, &stamps.blockchains.to_string())?;
        self.storage
            .save_sync_state(KEY_TOKENS_LAST_SYNC, &stamps.tokens.to_string())
    }
}

fn coin_entity(response: CoinResponse) -> Coin {
    Coin {
        uid: response.uid,
        name: response.name,
        code: response.code.to_uppercase(),
        market_cap_rank: response.market_cap_rank,
        coingecko_id: response.coingecko_id,
        image: response.image,
    }
}

fn blockchain_entity(response: BlockchainResponse) -> Blockchain {
    Blockchain {
        uid: response.uid,
        name: response.name,
        url: response.url,
    }
}

fn token_entity(response: TokenResponse) -> TokenEntity {
    TokenEntity {
        coin_uid: response.coin_uid,
        blockchain_uid: response.blockchain_uid,
        token_type: response.token_type,
        decimals: response.decimals,
        reference: response.address.unwrap_or_default(),
    }
}

fn variants(blockchain: &BlockchainType) -> Vec<TokenType> {
    match blockchain {
        BlockchainType::Bitcoin | BlockchainType::Litecoin => {
            Derivation::ALL.into_iter().map(TokenType::Derived).collect()
        }
        BlockchainType::BitcoinCash => AddressType::ALL
            .into_iter()
            .map(TokenType::AddressTyped)
            .collect(),
        _ => Vec::new(),
    }
}

/// Replaces the first token of each expanded blockchain with one copy per
/// derivation or address type.
fn expand_tokens(mut tokens: Vec<TokenEntity>) -> Vec<TokenEntity> {
    for blockchain in &EXPANDED_BLOCKCHAINS {
        let Some(index) = tokens
            .iter()
            .position(|t| t.blockchain_uid == blockchain.uid())
        else {
            continue;
        };

        let generic = tokens.remove(index);
        for variant in variants(blockchain) {
            let (kind, reference) = variant.parts();
            tokens.push(TokenEntity {
                token_type: kind.to_string(),
                reference: reference.to_string(),
                ..generic.clone()
            });
        }
    }
    tokens
}
