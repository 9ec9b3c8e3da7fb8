use crate::error::MirrorError;
use serde::Deserialize;

/// DexScreener endpoint listing the most recently created token profiles
pub const FEED_URL: &str = "https://api.dexscreener.com/token-profiles/latest/v1";

/// Hosts whose "Website" links are never mirrored. Matched as substrings of
/// the link hostname.
pub const BLOCKED_HOSTS: [&str; 8] = [
    "x.com",
    "twitter.com",
    "youtu.be",
    "youtube.com",
    "pump.fun",
    "tiktok.com",
    "warpcast.com",
    "pastebin.com",
];

/// A labeled link attached to a token profile
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileLink {
    #[serde(default, rename = "type")]
    pub link_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    pub url: String,
}

/// One item from the token-profile feed
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenProfile {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub token_address: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub links: Vec<ProfileLink>,
}

impl TokenProfile {
    /// The link labeled "Website", if the profile carries one
    pub fn website_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.label.as_deref() == Some("Website"))
            .map(|link| link.url.as_str())
    }
}

/// Fetches the most recently listed token profile
pub async fn latest_profile(
    client: &reqwest::Client,
) -> Result<Option<TokenProfile>, MirrorError> {
    let response = client.get(FEED_URL).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MirrorError::FetchStatus {
            url: FEED_URL.to_string(),
            status: status.as_u16(),
        });
    }

    let profiles: Vec<TokenProfile> = response
        .json()
        .await
        .map_err(|e| MirrorError::Feed(e.to_string()))?;

    Ok(profiles.into_iter().next())
}

/// Returns true when the hostname matches the fixed blocklist
pub fn is_blocked_host(host: &str) -> bool {
    BLOCKED_HOSTS.iter().any(|blocked| host.contains(blocked))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_profile() {
        let json = r#"{
            "url": "https://dexscreener.com/ethereum/0xabc",
            "chainId": "ethereum",
            "tokenAddress": "0xabc",
            "icon": "https://cdn.example/icon",
            "header": "https://cdn.example/header",
            "description": "a token",
            "links": [
                {"type": "twitter", "url": "https://x.com/token"},
                {"label": "Website", "url": "https://token.example"}
            ]
        }"#;

        let profile: TokenProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.chain_id.as_deref(), Some("ethereum"));
        assert_eq!(profile.website_link(), Some("https://token.example"));
    }

    #[test]
    fn test_profile_without_website_link() {
        let json = r#"{"links": [{"type": "telegram", "url": "https://t.me/x"}]}"#;
        let profile: TokenProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.website_link(), None);
    }

    #[test]
    fn test_blocklist() {
        assert!(is_blocked_host("x.com"));
        assert!(is_blocked_host("www.youtube.com"));
        assert!(is_blocked_host("pump.fun"));
        assert!(!is_blocked_host("token.example"));
    }
}
