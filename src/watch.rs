use crate::config::MirrorConfig;
use crate::crawlers::MirrorStatus;
use crate::error::MirrorError;
use crate::feed::{self, TokenProfile};
use crate::{Mirror, safety, token_info};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Chains the contract scan knows how to handle
const SUPPORTED_CHAINS: [&str; 2] = ["ethereum", "base"];

/// Polls the feed forever, mirroring one newly listed profile per tick.
///
/// The first tick fires immediately. Every failure is logged and the loop
/// continues; nothing in a single profile is fatal to the process.
pub async fn run(config: MirrorConfig) -> Result<(), MirrorError> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .build()?;

    let mut ticker = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));

    loop {
        ticker.tick().await;
        if let Err(e) = process_next_profile(&client, &config).await {
            ::log::error!("Profile processing failed: {}", e);
        }
    }
}

/// Handles one feed item end to end: blocklist gate, mirror, token
/// metadata, contract safety scan.
pub async fn process_next_profile(
    client: &reqwest::Client,
    config: &MirrorConfig,
) -> Result<(), MirrorError> {
    let Some(profile) = feed::latest_profile(client).await? else {
        ::log::info!("Feed returned no profiles");
        return Ok(());
    };

    let Some(website) = profile.website_link() else {
        ::log::info!("No website link found in token profile");
        return Ok(());
    };
    let website = website.to_string();

    let url = Url::parse(&website)?;
    let Some(host) = url.host_str() else {
        ::log::info!("Website link has no host: {}", website);
        return Ok(());
    };

    if feed::is_blocked_host(host) {
        ::log::info!("Skipping blocklisted host: {}", host);
        return Ok(());
    }

    let output_dir = Path::new(&config.output_base_dir).join(host);

    let status = Mirror::new(&website)
        .with_config(config.clone())
        .run()
        .await?;

    if status == MirrorStatus::Skipped {
        return Ok(());
    }

    // A mirror that aborted still gets its metadata; the abort marker makes
    // it deletion-eligible for the cleanup pass either way.
    if let Err(e) = token_info::save_token_info(client, &output_dir, &profile).await {
        ::log::error!("Failed to save token info for {}: {}", host, e);
    }

    process_contract(client, config, &profile).await;

    Ok(())
}

/// Runs the heuristic safety scan and archives the contract source.
/// Entirely best effort: missing keys or unsupported chains skip quietly.
async fn process_contract(
    client: &reqwest::Client,
    config: &MirrorConfig,
    profile: &TokenProfile,
) {
    let (Some(chain), Some(address)) = (profile.chain_id.as_deref(), profile.token_address.as_deref())
    else {
        ::log::info!("Profile has no chain or token address, skipping contract scan");
        return;
    };

    if !SUPPORTED_CHAINS.contains(&chain) {
        ::log::info!("Unsupported chain for contract scan: {}", chain);
        return;
    }

    let Ok(scan_key) = std::env::var("TTF_API_TOKEN") else {
        ::log::debug!("TTF_API_TOKEN not set, skipping contract scan");
        return;
    };
    let Ok(etherscan_key) = std::env::var("ETHERSCAN_API_KEY") else {
        ::log::debug!("ETHERSCAN_API_KEY not set, skipping contract scan");
        return;
    };

    let verdict = safety::scan_contract(client, address, chain, &scan_key).await;
    if verdict == safety::Verdict::Unsafe {
        ::log::info!("Contract {} classified unsafe, not archiving", address);
        return;
    }

    let source = match safety::fetch_source_code(client, address, chain, &etherscan_key).await {
        Ok(Some(source)) => source,
        Ok(None) => {
            ::log::info!("No verified source for contract {}", address);
            return;
        }
        Err(e) => {
            ::log::error!("Failed to fetch source for {}: {}", address, e);
            return;
        }
    };

    if let Err(e) = safety::save_contract(
        Path::new(&config.contracts_dir),
        address,
        chain,
        verdict,
        &source,
    ) {
        ::log::error!("Failed to save contract {}: {}", address, e);
    }
}
