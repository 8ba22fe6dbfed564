use crate::core::{Blockchain, Coin, FullCoin, Result, Storage, Token, TokenEntity, TokenQuery};
use std::collections::HashMap;
use std::sync::Arc;

/// Read access to the stored catalog.
pub struct CoinManager {
    storage: Arc<dyn Storage>,
}

impl CoinManager {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn all_coins(&self) -> Result<Vec<Coin>> {
        self.storage.all_coins()
    }

    pub fn coin(&self, uid: &str) -> Result<Option<Coin>> {
        Ok(self.storage.all_coins()?.into_iter().find(|c| c.uid == uid))
    }

    pub fn all_blockchains(&self) -> Result<Vec<Blockchain>> {
        self.storage.all_blockchains()
    }

    pub fn blockchain(&self, uid: &str) -> Result<Option<Blockchain>> {
        Ok(self
            .storage
            .all_blockchains()?
            .into_iter()
            .find(|b| b.uid == uid))
    }

    pub fn full_coin(&self, uid: &str) -> Result<Option<FullCoin>> {
        Ok(self
            .full_coins_where(|coin| coin.uid == uid)?
            .into_iter()
            .next())
    }

    /// Coins whose name or code contains `filter`, best ranked first.
    pub fn full_coins(&self, filter: &str, limit: usize) -> Result<Vec<FullCoin>> {
        let filter = filter.to_lowercase();
        let mut coins = self.full_coins_where(|coin| {
            coin.name.to_lowercase().contains(&filter) || coin.code.to_lowercase().contains(&filter)
        })?;

        coins.sort_by_key(|full| {
            (
                full.coin.market_cap_rank.is_none(),
                full.coin.market_cap_rank,
                full.coin.name.to_lowercase(),
            )
        });
        coins.truncate(limit);
        Ok(coins)
    }

    pub fn token(&self, query: &TokenQuery) -> Result<Option<Token>> {
        let entity = self
            .storage
            .all_tokens()?
            .into_iter()
            .find(|t| query.matches(t));

        let Some(entity) = entity else {
            return Ok(None);
        };
        let coin = self.coin(&entity.coin_uid)?;
        let blockchain = self.blockchain(&entity.blockchain_uid)?;
        Ok(coin
            .zip(blockchain)
            .map(|(coin, blockchain)| to_token(&entity, coin, blockchain)))
    }

    fn full_coins_where(&self, predicate: impl Fn(&Coin) -> bool) -> Result<Vec<FullCoin>> {
        let blockchains: HashMap<String, Blockchain> = self
            .storage
            .all_blockchains()?
            .into_iter()
            .map(|b| (b.uid.clone(), b))
            .collect();

        let mut tokens_by_coin: HashMap<String, Vec<TokenEntity>> = HashMap::new();
        for token in self.storage.all_tokens()? {
            tokens_by_coin
                .entry(token.coin_uid.clone())
                .or_default()
                .push(token);
        }

        Ok(self
            .storage
            .all_coins()?
            .into_iter()
            .filter(|coin| predicate(coin))
            .map(|coin| {
                let tokens = tokens_by_coin
                    .get(&coin.uid)
                    .map(|entities| {
                        entities
                            .iter()
                            .filter_map(|entity| {
                                blockchains.get(&entity.blockchain_uid).map(|blockchain| {
                                    to_token(entity, coin.clone(), blockchain.clone())
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                FullCoin { coin, tokens }
            })
            .collect())
    }
}

fn to_token(entity: &TokenEntity, coin: Coin, blockchain: Blockchain) -> Token {
    Token {
        coin,
        blockchain,
        token_type: entity.typed(),
        decimals: entity.decimals,
    }
}
