use clap::ValueEnum;

/// Address encoding rules of one network. Built once at start-up and passed
/// by reference wherever an address has to be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    pub name: &'static str,
    pub coin: &'static str,
    pub pubkey_hash_addr_id: u8,
    pub script_hash_addr_id: u8,
    pub bech32_hrp: &'static str,
}

pub const NMC_MAINNET: ChainParams = ChainParams {
    name: "namecoin-mainnet",
    coin: "NMC",
    pubkey_hash_addr_id: 0x34,
    script_hash_addr_id: 0x0d,
    bech32_hrp: "nc",
};

pub const NMC_TESTNET: ChainParams = ChainParams {
    name: "namecoin-testnet",
    coin: "NMC",
    pubkey_hash_addr_id: 0x6f,
    script_hash_addr_id: 0xc4,
    bech32_hrp: "tn",
};

pub const NMC_REGTEST: ChainParams = ChainParams {
    name: "namecoin-regtest",
    coin: "NMC",
    pubkey_hash_addr_id: 0x6f,
    script_hash_addr_id: 0xc4,
    bech32_hrp: "ncrt",
};

pub const BTC_MAINNET: ChainParams = ChainParams {
    name: "bitcoin-mainnet",
    coin: "BTC",
    pubkey_hash_addr_id: 0x00,
    script_hash_addr_id: 0x05,
    bech32_hrp: "bc",
};

pub const BTC_TESTNET: ChainParams = ChainParams {
    name: "bitcoin-testnet",
    coin: "BTC",
    pubkey_hash_addr_id: 0x6f,
    script_hash_addr_id: 0xc4,
    bech32_hrp: "tb",
};

pub const BTC_REGTEST: ChainParams = ChainParams {
    name: "bitcoin-regtest",
    coin: "BTC",
    pubkey_hash_addr_id: 0x6f,
    script_hash_addr_id: 0xc4,
    bech32_hrp: "bcrt",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Network {
    NmcMainnet,
    NmcTestnet,
    NmcRegtest,
    BtcMainnet,
    BtcTestnet,
    BtcRegtest,
}

impl Network {
    pub fn params(self) -> ChainParams {
        match self {
            Network::NmcMainnet => NMC_MAINNET,
            Network::NmcTestnet => NMC_TESTNET,
            Network::NmcRegtest => NMC_REGTEST,
            Network::BtcMainnet => BTC_MAINNET,
            Network::BtcTestnet => BTC_TESTNET,
            Network::BtcRegtest => BTC_REGTEST,
        }
    }
}
