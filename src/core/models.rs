//! Catalog entities: coins, blockchains and tokens

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub uid: String,
    pub name: String,
    pub code: String,
    pub market_cap_rank: Option<u32>,
    pub coingecko_id: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blockchain {
    pub uid: String,
    pub name: String,
    pub url: Option<String>,
}

impl Blockchain {
    pub fn blockchain_type(&self) -> BlockchainType {
        BlockchainType::from_uid(&self.uid)
    }
}

/// Token row as persisted. Identity is the whole
/// (coin_uid, blockchain_uid, token_type, reference) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntity {
    pub coin_uid: String,
    pub blockchain_uid: String,
    pub token_type: String,
    pub decimals: Option<u8>,
    pub reference: String,
}

impl TokenEntity {
    pub fn typed(&self) -> TokenType {
        TokenType::from_parts(&self.token_type, &self.reference)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Derivation {
    Bip44,
    Bip49,
    Bip84,
    Bip86,
}

impl Derivation {
    pub const ALL: [Derivation; 4] = [
        Derivation::Bip44,
        Derivation::Bip49,
        Derivation::Bip84,
        Derivation::Bip86,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Derivation::Bip44 => "bip44",
            Derivation::Bip49 => "bip49",
            Derivation::Bip84 => "bip84",
            Derivation::Bip86 => "bip86",
        }
    }
}

impl FromStr for Derivation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Derivation::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| format!("Unknown derivation: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum AddressType {
    Type0,
    Type145,
}

impl AddressType {
    pub const ALL: [AddressType; 2] = [AddressType::Type0, AddressType::Type145];

    pub fn name(&self) -> &'static str {
        match self {
            AddressType::Type0 => "type0",
            AddressType::Type145 => "type145",
        }
    }
}

impl FromStr for AddressType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressType::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("Unknown address type: {s}"))
    }
}

/// Typed view over a stored (type, reference) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenType {
    Native,
    Eip20(String),
    Spl(String),
    Jetton(String),
    Derived(Derivation),
    AddressTyped(AddressType),
    Unsupported { kind: String, reference: String },
}

impl TokenType {
    pub const NATIVE: &'static str = "native";
    pub const DERIVED: &'static str = "derived";
    pub const ADDRESS_TYPE: &'static str = "address_type";

    pub fn from_parts(kind: &str, reference: &str) -> Self {
        let unsupported = || TokenType::Unsupported {
            kind: kind.to_string(),
            reference: reference.to_string(),
        };

        match kind {
            Self::NATIVE => TokenType::Native,
            "eip20" => TokenType::Eip20(reference.to_string()),
            "spl" => TokenType::Spl(reference.to_string()),
            "the-open-network" | "jetton" => TokenType::Jetton(reference.to_string()),
            Self::DERIVED => reference
                .parse()
                .map(TokenType::Derived)
                .unwrap_or_else(|_| unsupported()),
            Self::ADDRESS_TYPE => reference
                .parse()
                .map(TokenType::AddressTyped)
                .unwrap_or_else(|_| unsupported()),
            _ => unsupported(),
        }
    }

    /// Stored (type, reference) pair for this token type.
    pub fn parts(&self) -> (&str, &str) {
        match self {
            TokenType::Native => (Self::NATIVE, ""),
            TokenType::Eip20(address) => ("eip20", address),
            TokenType::Spl(address) => ("spl", address),
            TokenType::Jetton(address) => ("jetton", address),
            TokenType::Derived(derivation) => (Self::DERIVED, derivation.name()),
            TokenType::AddressTyped(address_type) => (Self::ADDRESS_TYPE, address_type.name()),
            TokenType::Unsupported { kind, reference } => (kind, reference),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockchainType {
    Bitcoin,
    BitcoinCash,
    ECash,
    Litecoin,
    Dash,
    Zcash,
    Ethereum,
    BinanceSmartChain,
    Polygon,
    Avalanche,
    Optimism,
    ArbitrumOne,
    Solana,
    Gnosis,
    Fantom,
    Tron,
    Ton,
    Base,
    ZkSync,
    Unsupported(String),
}

impl BlockchainType {
    pub fn uid(&self) -> &str {
        match self {
            BlockchainType::Bitcoin => "bitcoin",
            BlockchainType::BitcoinCash => "bitcoin-cash",
            BlockchainType::ECash => "ecash",
            BlockchainType::Litecoin => "litecoin",
            BlockchainType::Dash => "dash",
            BlockchainType::Zcash => "zcash",
            BlockchainType::Ethereum => "ethereum",
            BlockchainType::BinanceSmartChain => "binance-smart-chain",
            BlockchainType::Polygon => "polygon-pos",
            BlockchainType::Avalanche => "avalanche",
            BlockchainType::Optimism => "optimistic-ethereum",
            BlockchainType::ArbitrumOne => "arbitrum-one",
            BlockchainType::Solana => "solana",
            BlockchainType::Gnosis => "gnosis",
            BlockchainType::Fantom => "fantom",
            BlockchainType::Tron => "tron",
            BlockchainType::Ton => "the-open-network",
            BlockchainType::Base => "base",
            BlockchainType::ZkSync => "zksync",
            BlockchainType::Unsupported(uid) => uid,
        }
    }

    pub fn from_uid(uid: &str) -> Self {
        match uid {
            "bitcoin" => BlockchainType::Bitcoin,
            "bitcoin-cash" => BlockchainType::BitcoinCash,
            "ecash" => BlockchainType::ECash,
            "litecoin" => BlockchainType::Litecoin,
            "dash" => BlockchainType::Dash,
            "zcash" => BlockchainType::Zcash,
            "ethereum" => BlockchainType::Ethereum,
            "binance-smart-chain" => BlockchainType::BinanceSmartChain,
            "polygon-pos" => BlockchainType::Polygon,
            "avalanche" => BlockchainType::Avalanche,
            "optimistic-ethereum" => BlockchainType::Optimism,
            "arbitrum-one" => BlockchainType::ArbitrumOne,
            "solana" => BlockchainType::Solana,
            "gnosis" => BlockchainType::Gnosis,
            "fantom" => BlockchainType::Fantom,
            "tron" => BlockchainType::Tron,
            "the-open-network" => BlockchainType::Ton,
            "base" => BlockchainType::Base,
            "zksync" => BlockchainType::ZkSync,
            other => BlockchainType::Unsupported(other.to_string()),
        }
    }
}

impl Display for BlockchainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uid())
    }
}

/// Lookup key for a single token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenQuery {
    pub blockchain_type: BlockchainType,
    pub token_type: TokenType,
}

impl TokenQuery {
    pub fn new(blockchain_type: BlockchainType, token_type: TokenType) -> Self {
        Self {
            blockchain_type,
            token_type,
        }
    }

    pub fn matches(&self, entity: &TokenEntity) -> bool {
        let (kind, reference) = self.token_type.parts();
        entity.blockchain_uid == self.blockchain_type.uid()
            && entity.token_type == kind
            && entity.reference.eq_ignore_ascii_case(reference)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub coin: Coin,
    pub blockchain: Blockchain,
    pub token_type: TokenType,
    pub decimals: Option<u8>,
}

/// A coin together with every token it has across blockchains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullCoin {
    pub coin: Coin,
    pub tokens: Vec<Token>,
}
