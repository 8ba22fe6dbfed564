use crate::core::storage::{global_market_key, historical_price_key};
use crate::core::{
    Blockchain, Coin, CoinHistoricalPrice, GlobalMarketInfo, Result, Storage, TimePeriod,
    TokenEntity,
};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use tracing::debug;

const COINS: &str = "coins";
const BLOCKCHAINS: &str = "blockchains";
const TOKENS: &str = "tokens";
const SYNC_STATE: &str = "sync_state";
const HISTORICAL_PRICES: &str = "historical_prices";
const GLOBAL_MARKET_INFO: &str = "global_market_info";

/// `fjall`-backed storage. Each table lives in its own partition and values
/// are stored as JSON.
pub struct DiskStorage {
    keyspace: Keyspace,
    coins: PartitionHandle,
    blockchains: PartitionHandle,
    tokens: PartitionHandle,
    sync_state: PartitionHandle,
    historical_prices: PartitionHandle,
    global_market_info: PartitionHandle,
}

fn token_key(token: &TokenEntity) -> String {
    format!(
        "{}|{}|{}|{}",
        token.coin_uid, token.blockchain_uid, token.token_type, token.reference
    )
}

fn read_all<V: DeserializeOwned>(partition: &PartitionHandle) -> Result<Vec<V>> {
    partition
        .iter()
        .map(|item| {
            let (_, value) = item?;
            Ok(serde_json::from_slice(&value)?)
        })
        .collect()
}

fn read_one<V: DeserializeOwned>(partition: &PartitionHandle, key: &str) -> Result<Option<V>> {
    match partition.get(key)? {
        Some(value) => {
            debug!("Cache HIT for key: {}", key);
            Ok(Some(serde_json::from_slice(&value)?))
        }
        None => {
            debug!("Cache MISS for key: {}", key);
            Ok(None)
        }
    }
}

impl DiskStorage {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .map_err(|e| crate::core::MarketError::storage(e.to_string()))?;

        let keyspace = fjall::Config::new(path).open()?;
        let open = |name: &str| keyspace.open_partition(name, PartitionCreateOptions::default());

        Ok(Self {
            coins: open(COINS)?,
            blockchains: open(BLOCKCHAINS)?,
            tokens: open(TOKENS)?,
            sync_state: open(SYNC_STATE)?,
            historical_prices: open(HISTORICAL_PRICES)?,
            global_market_info: open(GLOBAL_MARKET_INFO)?,
            keyspace,
        })
    }

    fn put<V: Serialize>(&self, partition: &PartitionHandle, key: String, value: &V) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        partition.insert(key.as_str(), bytes)?;
        debug!("Cache PUT for key: {}", key);
        Ok(())
    }
}

impl Storage for DiskStorage {
    fn replace_catalog(
        &self,
        coins: &[Coin],
        blockchains: &[Blockchain],
        tokens: &[TokenEntity],
    ) -> Result<()> {
        let mut batch = self.keyspace.batch();

        for partition in [&self.coins, &self.blockchains, &self.tokens] {
            for key in partition.keys() {
                batch.remove(partition, key?);
            }
        }
        for coin in coins {
            batch.insert(&self.coins, coin.uid.as_str(), serde_json::to_vec(coin)?);
        }
        for blockchain in blockchains {
            batch.insert(
                &self.blockchains,
                blockchain.uid.as_str(),
                serde_json::to_vec(blockchain)?,
            );
        }
        for token in tokens {
            batch.insert(&self.tokens, token_key(token), serde_json::to_vec(token)?);
        }

        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(
            coins = coins.len(),
            blockchains = blockchains.len(),
            tokens = tokens.len(),
            "Catalog REPLACE"
        );
        Ok(())
    }

    fn all_coins(&self) -> Result<Vec<Coin>> {
        read_all(&self.coins)
    }

    fn all_blockchains(&self) -> Result<Vec<Blockchain>> {
        read_all(&self.blockchains)
    }

    fn all_tokens(&self) -> Result<Vec<TokenEntity>> {
        read_all(&self.tokens)
    }

    fn sync_state(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .sync_state
            .get(key)?
            .map(|value| String::from_utf8_lossy(&value).into_owned()))
    }

    fn save_sync_state(&self, key: &str, value: &str) -> Result<()> {
        self.sync_state.insert(key, value)?;
        Ok(())
    }

    fn historical_price(
        &self,
        coin_uid: &str,
        currency_code: &str,
        timestamp: i64,
    ) -> Result<Option<CoinHistoricalPrice>> {
        read_one(
            &self.historical_prices,
            &historical_price_key(coin_uid, currency_code, timestamp),
        )
    }

    fn save_historical_price(&self, price: &CoinHistoricalPrice) -> Result<()> {
        let key = historical_price_key(&price.coin_uid, &price.currency_code, price.timestamp);
        self.put(&self.historical_prices, key, price)
    }

    fn global_market_info(
        &self,
        currency_code: &str,
        time_period: TimePeriod,
    ) -> Result<Option<GlobalMarketInfo>> {
        read_one(
            &self.global_market_info,
            &global_market_key(currency_code, time_period),
        )
    }

    fn save_global_market_info(&self, info: &GlobalMarketInfo) -> Result<()> {
        let key = global_market_key(&info.currency_code, info.time_period);
        self.put(&self.global_market_info, key, info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GlobalMarketPoint;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    fn coin(uid: &str) -> Coin {
        Coin {
            uid: uid.to_string(),
            name: uid.to_string(),
            code: uid.to_uppercase(),
            market_cap_rank: Some(1),
            coingecko_id: Some(uid.to_string()),
            image: None,
        }
    }

    fn token(coin_uid: &str, blockchain_uid: &str, reference: &str) -> TokenEntity {
        TokenEntity {
            coin_uid: coin_uid.to_string(),
            blockchain_uid: blockchain_uid.to_string(),
            token_type: "derived".to_string(),
            decimals: Some(8),
            reference: reference.to_string(),
        }
    }

    #[test]
    fn test_replace_catalog_round_trip() {
        let dir = tempdir().unwrap();
        let storage = DiskStorage::open(dir.path()).unwrap();

        let blockchain = Blockchain {
            uid: "bitcoin".to_string(),
            name: "Bitcoin".to_string(),
            url: Some("https://blockchair.com/bitcoin/transaction/$ref".to_string()),
        };
        let tokens = vec![
            token("bitcoin", "bitcoin", "bip44"),
            token("bitcoin", "bitcoin", "bip84"),
        ];
        storage
            .replace_catalog(&[coin("bitcoin")], &[blockchain.clone()], &tokens)
            .unwrap();

        assert_eq!(storage.all_coins().unwrap(), vec![coin("bitcoin")]);
        assert_eq!(storage.all_blockchains().unwrap(), vec![blockchain]);
        assert_eq!(storage.all_tokens().unwrap(), tokens);
    }

    #[test]
    fn test_replace_catalog_removes_stale_rows() {
        let dir = tempdir().unwrap();
        let storage = DiskStorage::open(dir.path()).unwrap();

        storage
            .replace_catalog(
                &[coin("bitcoin"), coin("ethereum")],
                &[],
                &[token("bitcoin", "bitcoin", "bip44")],
            )
            .unwrap();
        storage
            .replace_catalog(&[coin("ethereum")], &[], &[])
            .unwrap();

        assert_eq!(storage.all_coins().unwrap(), vec![coin("ethereum")]);
        assert!(storage.all_tokens().unwrap().is_empty());
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let storage = DiskStorage::open(dir.path()).unwrap();
            storage.replace_catalog(&[coin("bitcoin")], &[], &[]).unwrap();
            storage.save_sync_state("coins", "42").unwrap();
        }

        let storage = DiskStorage::open(dir.path()).unwrap();
        assert_eq!(storage.all_coins().unwrap().len(), 1);
        assert_eq!(storage.sync_state("coins").unwrap().as_deref(), Some("42"));
    }

    #[test]
    fn test_historical_and_global_market_entries() {
        let dir = tempdir().unwrap();
        let storage = DiskStorage::open(dir.path()).unwrap();

        let price = CoinHistoricalPrice {
            coin_uid: "bitcoin".to_string(),
            currency_code: "USD".to_string(),
            value: Decimal::new(2500012, 2),
            timestamp: 1_600_000_000,
        };
        storage.save_historical_price(&price).unwrap();
        assert_eq!(
            storage
                .historical_price("bitcoin", "USD", 1_600_000_000)
                .unwrap(),
            Some(price)
        );

        let info = GlobalMarketInfo {
            currency_code: "USD".to_string(),
            time_period: TimePeriod::Week1,
            points: vec![GlobalMarketPoint {
                timestamp: 1_600_000_000,
                market_cap: Decimal::new(1_000_000, 0),
                volume_24h: Decimal::new(50_000, 0),
                defi_market_cap: None,
                tvl: Some(Decimal::new(3_000, 0)),
                btc_dominance: Some(Decimal::new(4512, 2)),
            }],
            timestamp: 1_600_000_100,
        };
        storage.save_global_market_info(&info).unwrap();
        assert_eq!(
            storage
                .global_market_info("USD", TimePeriod::Week1)
                .unwrap(),
            Some(info)
        );
        assert!(
            storage
                .global_market_info("EUR", TimePeriod::Week1)
                .unwrap()
                .is_none()
        );
    }
}
