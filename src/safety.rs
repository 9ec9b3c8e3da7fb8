use crate::error::MirrorError;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Security warnings that mark a contract as ruggable
const RUG_WARNINGS: [&str; 11] = [
    "Possible 100% Tax Trigger found!",
    "SUSPICIOUS CODE",
    "RUGGABLE",
    "Blacklist",
    "Whitelist",
    "Max Transaction",
    "Trading Disable",
    "Set Tax",
    "Max Wallet",
    "<b>Possible Delayed Honeypot. BE CAREFUL</b>",
    "<b>VERY POSSIBLE Delayed Honeypot. BE CAREFUL</b>",
];

/// Warnings tolerated when ownership can be renounced
const RENOUNCE_EXEMPT: [&str; 6] = [
    "Blacklist",
    "Whitelist",
    "Trading Disable",
    "Max Transaction",
    "Set Tax",
    "Max Wallet",
];

/// Function names considered benign inside a FUNCTIONS warning
const SAFE_FUNCTIONS: [&str; 2] = ["_update", "HARDCORE SELL LIMIT"];

/// Outcome of the heuristic contract scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Unsafe,
    Unverified,
}

/// Classifies a contract from its scan warnings and honeypot flag.
///
/// Pure so the heuristics are testable without the scan API.
pub fn classify_warnings(warnings: &[String], honeypot: bool) -> Verdict {
    for warning in warnings {
        if RUG_WARNINGS.contains(&warning.as_str()) {
            if !RENOUNCE_EXEMPT.contains(&warning.as_str()) {
                ::log::info!("Contract flagged without renounce exemption: {}", warning);
                return Verdict::Unsafe;
            }
        } else if warning.contains("are external contracts") {
            ::log::info!("Contract depends on external contracts");
            return Verdict::Unsafe;
        } else if warning.contains("FUNCTIONS:") {
            if !SAFE_FUNCTIONS.iter().any(|safe| warning.contains(safe)) {
                ::log::info!("Contract exposes unsafe functions: {}", warning);
                return Verdict::Unsafe;
            }
        } else if warning.contains("Honeypot") || warning.contains("BE CAREFUL") {
            ::log::info!("Contract carries a honeypot warning: {}", warning);
            return Verdict::Unsafe;
        }
    }

    if honeypot {
        ::log::info!("Contract is flagged as a honeypot");
        return Verdict::Unsafe;
    }

    Verdict::Safe
}

/// Queries the scan API and classifies the contract.
///
/// API failures and unknown tokens classify as `Unverified` rather than
/// propagating, matching the best-effort posture of the watch loop.
pub async fn scan_contract(
    client: &reqwest::Client,
    contract_address: &str,
    chain: &str,
    api_key: &str,
) -> Verdict {
    let chain = if chain == "ethereum" { "eth" } else { chain };
    let url = format!(
        "https://ttfapiv2.ttfbot.com/coolscan?contract={contract_address}&chain={chain}&apiKey={api_key}&airdrops=true"
    );

    let data: Value = match fetch_json(client, &url).await {
        Ok(data) => data,
        Err(e) => {
            ::log::error!("Scan API request failed for {}: {}", contract_address, e);
            return Verdict::Unverified;
        }
    };

    if data.get("token").is_none() || data.get("error").is_some() {
        ::log::info!("Contract {} cannot be verified by the scan API", contract_address);
        return Verdict::Unverified;
    }

    // The response shape differs per chain
    let (security, honeypot) = match chain {
        "eth" => (
            data.pointer("/token/security"),
            data.pointer("/market/taxes/honeyPot"),
        ),
        "base" => (data.pointer("/security"), data.pointer("/tax/isHoneypot")),
        _ => (None, None),
    };

    let warnings: Vec<String> = security
        .and_then(|v| v.as_array())
        .map(|array| {
            array
                .iter()
                .filter_map(|w| w.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();
    let honeypot = honeypot.and_then(|v| v.as_bool()).unwrap_or(false);

    classify_warnings(&warnings, honeypot)
}

/// Fetches the verified source code from the Etherscan v2 API.
///
/// Multi-file payloads arrive as a doubly-braced JSON blob; their `sources`
/// map is concatenated into one flat listing.
pub async fn fetch_source_code(
    client: &reqwest::Client,
    contract_address: &str,
    chain: &str,
    api_key: &str,
) -> Result<Option<String>, MirrorError> {
    let chain_num = match chain {
        "ethereum" => 1,
        "base" => 8453,
        _ => return Ok(None),
    };

    let url = format!(
        "https://api.etherscan.io/v2/api?chainId={chain_num}&module=contract&action=getsourcecode&address={contract_address}&apikey={api_key}"
    );

    let data = fetch_json(client, &url).await?;
    let Some(raw) = data
        .pointer("/result/0/SourceCode")
        .and_then(|v| v.as_str())
    else {
        ::log::info!("No source code for contract {}", contract_address);
        return Ok(None);
    };

    Ok(flatten_source(raw))
}

fn flatten_source(raw: &str) -> Option<String> {
    if !raw.starts_with("{{") {
        return Some(raw.to_string());
    }

    // One brace off each end; a truncated payload simply fails to flatten
    let inner = raw.strip_prefix('{')?.strip_suffix('}')?;
    let value: Value = serde_json::from_str(inner).ok()?;
    let sources = value.get("sources")?.as_object()?;

    let mut flattened = String::new();
    for entry in sources.values() {
        if let Some(content) = entry.get("content").and_then(|c| c.as_str()) {
            flattened.push_str(content);
        }
    }
    Some(flattened)
}

/// Persists a contract source under the contracts directory, suffixed with
/// its verdict. Existing files are left untouched.
pub fn save_contract(
    contracts_dir: &Path,
    contract_address: &str,
    chain: &str,
    verdict: Verdict,
    source_code: &str,
) -> Result<(), MirrorError> {
    let suffix = if verdict == Verdict::Safe {
        "_safe"
    } else {
        "_unsafe"
    };
    let path = contracts_dir.join(format!("{chain}_{contract_address}{suffix}.txt"));

    fs::create_dir_all(contracts_dir)
        .map_err(|e| MirrorError::io(contracts_dir.to_path_buf(), e))?;

    if path.exists() {
        ::log::info!("Contract file {} already exists, skipping", path.display());
        return Ok(());
    }

    fs::write(&path, source_code).map_err(|e| MirrorError::io(path.clone(), e))?;
    ::log::info!("Saved contract source to {}", path.display());
    Ok(())
}

async fn fetch_json(client: &reqwest::Client, url: &str) -> Result<Value, MirrorError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MirrorError::FetchStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warnings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clean_contract_is_safe() {
        assert_eq!(classify_warnings(&[], false), Verdict::Safe);
    }

    #[test]
    fn test_renounce_exempt_warnings_are_tolerated() {
        let verdict = classify_warnings(&warnings(&["Blacklist", "Max Wallet"]), false);
        assert_eq!(verdict, Verdict::Safe);
    }

    #[test]
    fn test_rug_warning_without_exemption() {
        let verdict = classify_warnings(&warnings(&["RUGGABLE"]), false);
        assert_eq!(verdict, Verdict::Unsafe);
    }

    #[test]
    fn test_external_contract_warning() {
        let verdict =
            classify_warnings(&warnings(&["3 are external contracts"]), false);
        assert_eq!(verdict, Verdict::Unsafe);
    }

    #[test]
    fn test_unsafe_functions_warning() {
        let verdict = classify_warnings(&warnings(&["FUNCTIONS: setFees"]), false);
        assert_eq!(verdict, Verdict::Unsafe);

        let verdict = classify_warnings(&warnings(&["FUNCTIONS: _update"]), false);
        assert_eq!(verdict, Verdict::Safe);
    }

    #[test]
    fn test_honeypot_flag() {
        assert_eq!(classify_warnings(&[], true), Verdict::Unsafe);
    }

    #[test]
    fn test_flatten_single_file_source() {
        assert_eq!(
            flatten_source("contract Token {}").as_deref(),
            Some("contract Token {}")
        );
    }

    #[test]
    fn test_flatten_truncated_source_does_not_panic() {
        // Doubly-braced prefix but cut off mid-payload, ending on a
        // multibyte character
        assert_eq!(flatten_source("{{\"sources\": \"é"), None);
    }

    #[test]
    fn test_flatten_multi_file_source() {
        let raw = r#"{{"language":"Solidity","sources":{"A.sol":{"content":"contract A {}"},"B.sol":{"content":"contract B {}"}}}}"#;
        let flattened = flatten_source(raw).unwrap();
        assert!(flattened.contains("contract A {}"));
        assert!(flattened.contains("contract B {}"));
    }
}
