use alloy::primitives::Address;
use dotenvy::dotenv;
use eyre::{eyre, Result};
use rust_decimal::Decimal;
use std::{env, net::IpAddr, str::FromStr, time::Duration};
use tracing::{info, warn};

/// Polygon routers and burn sinks. Transfers touching these are swaps or
/// burns, never whales.
pub const DEFAULT_EXCHANGE_ADDRESSES: &[&str] = &[
    "0x0000000000000000000000000000000000000000", // mint / burn
    "0x000000000000000000000000000000000000dEaD", // burn
    "0xa5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff", // QuickSwap V2 router
    "0xf5b509bB0909a69B1c207E495f687a596C168E12", // QuickSwap V3 router
    "0xE592427A0AEce92De3Edee1F18E0157C05861564", // Uniswap V3 SwapRouter
    "0x68b3465833fb72A70ecDF485E0e4C7bD8665Fc45", // Uniswap SwapRouter02
    "0x1111111254EEB25477B68fb85Ed929f73A960582", // 1inch v5 router
];

pub const DEFAULT_LGNS_CONTRACT: &str = "0xeB51D9A39AD5EEF215dC0Bf39a8821ff804A0F01";

#[derive(Debug, Clone)]
pub struct Config {
    pub explorer_api_url: String,
    pub explorer_api_key: Option<String>, // None disables the live fetch
    pub chain_id: u64,
    pub dexscreener_api_url: String,
    pub geckoterminal_api_url: String,
    pub token_contract: Address,
    pub exchange_addresses: Vec<Address>,
    pub whale_threshold: Decimal,
    pub wallet_limit: usize,
    pub transfer_page_size: u32,
    pub cache_ttl: Duration,
    pub fallback_price: Decimal,
    pub http_timeout: Duration,
    pub bind_addr: IpAddr,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            explorer_api_url: "https://api.etherscan.io/v2/api".to_string(),
            explorer_api_key: None,
            chain_id: 137,
            dexscreener_api_url: "https://api.dexscreener.com/latest/dex/tokens".to_string(),
            geckoterminal_api_url:
                "https://api.geckoterminal.com/api/v2/networks/polygon_pos/tokens".to_string(),
            token_contract: DEFAULT_LGNS_CONTRACT
                .parse()
                .unwrap_or(Address::ZERO),
            exchange_addresses: parse_addresses(DEFAULT_EXCHANGE_ADDRESSES.iter().copied()),
            whale_threshold: Decimal::from(50_000),
            wallet_limit: 20,
            transfer_page_size: 1000,
            cache_ttl: Duration::from_secs(60),
            fallback_price: Decimal::new(636, 2),
            http_timeout: Duration::from_secs(10),
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            port: 8080,
        }
    }
}

fn parse_addresses<'a>(items: impl Iterator<Item = &'a str>) -> Vec<Address> {
    items
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<Address>() {
            Ok(a) => Some(a),
            Err(e) => {
                warn!("Ignoring bad address {:?}: {}", s, e);
                None
            }
        })
        .collect()
}

/// Read `key` and parse it, keeping `default` when unset or malformed
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} = {:?} is not valid, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

pub fn load() -> Result<Config> {
    dotenv().ok(); // .env is optional

    let defaults = Config::default();

    // Empty key is treated the same as a missing one
    let explorer_api_key = env::var("POLYGONSCAN_API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    let token_contract = match env::var("LGNS_CONTRACT") {
        Ok(s) => s
            .trim()
            .parse::<Address>()
            .map_err(|e| eyre!("LGNS_CONTRACT is not an address: {}", e))?,
        Err(_) => defaults.token_contract,
    };

    // Extra exchange / pair addresses extend the built-in set
    let mut exchange_addresses = defaults.exchange_addresses;
    if let Ok(extra) = env::var("EXCHANGE_ADDRESSES") {
        exchange_addresses.extend(parse_addresses(extra.split(',')));
    }

    let cfg = Config {
        explorer_api_url: env::var("POLYGONSCAN_API_URL").unwrap_or(defaults.explorer_api_url),
        explorer_api_key,
        chain_id: env_or("CHAIN_ID", defaults.chain_id),
        dexscreener_api_url: env::var("DEXSCREENER_API_URL")
            .unwrap_or(defaults.dexscreener_api_url),
        geckoterminal_api_url: env::var("GECKOTERMINAL_API_URL")
            .unwrap_or(defaults.geckoterminal_api_url),
        token_contract,
        exchange_addresses,
        whale_threshold: env_or("WHALE_THRESHOLD", defaults.whale_threshold),
        wallet_limit: env_or("WALLET_LIMIT", defaults.wallet_limit),
        transfer_page_size: env_or("TRANSFER_PAGE_SIZE", defaults.transfer_page_size),
        cache_ttl: Duration::from_secs(env_or("CACHE_TTL_SECS", 60)),
        fallback_price: env_or("FALLBACK_PRICE", defaults.fallback_price),
        http_timeout: Duration::from_secs(env_or("HTTP_TIMEOUT_SECS", 10)),
        bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
        port: env_or("PORT", defaults.port),
    };

    if cfg.explorer_api_key.is_none() {
        warn!("POLYGONSCAN_API_KEY not set; whale data will use fallback");
    }

    info!("Loaded config: {:?}", cfg);

    Ok(cfg)
}
