use crate::error::MirrorError;
use crate::feed::TokenProfile;
use std::fs;
use std::path::Path;

/// Image variant requested from the profile CDN
const XL_SIZE: &str = "?size=xl";

/// Populates `output_dir/tokenInfo/` with the profile's description and its
/// header/logo images. A mirror missing this subtree is deletion-eligible.
pub async fn save_token_info(
    client: &reqwest::Client,
    output_dir: &Path,
    profile: &TokenProfile,
) -> Result<(), MirrorError> {
    let token_info_dir = output_dir.join("tokenInfo");
    fs::create_dir_all(&token_info_dir)
        .map_err(|e| MirrorError::io(token_info_dir.clone(), e))?;

    save_description(
        &token_info_dir,
        profile.description.as_deref().unwrap_or_default(),
    )?;

    let header = profile
        .header
        .as_deref()
        .ok_or_else(|| MirrorError::Feed("profile has no header image".to_string()))?;
    let icon = profile
        .icon
        .as_deref()
        .ok_or_else(|| MirrorError::Feed("profile has no icon image".to_string()))?;

    download_image(
        client,
        &format!("{header}{XL_SIZE}"),
        &token_info_dir.join("header.png"),
    )
    .await?;
    download_image(
        client,
        &format!("{icon}{XL_SIZE}"),
        &token_info_dir.join("logo.png"),
    )
    .await?;

    Ok(())
}

/// Writes the profile description next to the images
pub fn save_description(token_info_dir: &Path, description: &str) -> Result<(), MirrorError> {
    let path = token_info_dir.join("description.txt");
    fs::write(&path, description).map_err(|e| MirrorError::io(path.clone(), e))?;
    ::log::info!("Saved description to {}", path.display());
    Ok(())
}

async fn download_image(
    client: &reqwest::Client,
    image_url: &str,
    output_path: &Path,
) -> Result<(), MirrorError> {
    let response = client.get(image_url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MirrorError::FetchStatus {
            url: image_url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await?;
    fs::write(output_path, &bytes).map_err(|e| MirrorError::io(output_path.to_path_buf(), e))?;
    ::log::info!("Saved image to {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_description() {
        let dir = TempDir::new().unwrap();
        save_description(dir.path(), "a fine token").unwrap();
        let saved = fs::read_to_string(dir.path().join("description.txt")).unwrap();
        assert_eq!(saved, "a fine token");
    }

    #[test]
    fn test_save_empty_description() {
        let dir = TempDir::new().unwrap();
        save_description(dir.path(), "").unwrap();
        assert!(dir.path().join("description.txt").exists());
    }
}
