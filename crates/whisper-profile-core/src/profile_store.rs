//! Profile Store
//!
//! Persists the profile record as a single JSON file readable only by the
//! owning user. Writes go to a temp file which is then renamed over the
//! target, so a half-written file is never picked up on the next load.

use crate::profile::Profile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// File-backed profile storage
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Load the stored profile
    ///
    /// Returns None if no profile has been saved yet.
    pub fn load(&self) -> anyhow::Result<Option<Profile>> {
        if !self.path.exists() {
            tracing::info!(op = "profile_store.load", hit = false, "No stored profile");
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let profile: Profile = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid profile file {}: {}", self.path.display(), e))?;

        if profile.client_id.is_empty() {
            anyhow::bail!("Profile file {} has no clientId", self.path.display());
        }

        tracing::info!(
            op = "profile_store.load",
            hit = true,
            profile_id = %profile.profile_id,
            "Stored profile loaded"
        );

        Ok(Some(profile))
    }

    /// Save the profile (temp file + rename, 0600)
    pub fn save(&self, profile: &Profile) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec_pretty(profile)?;
        let temp_path = self.temp_path();

        {
            let mut file = fs::File::create(&temp_path)?;

            #[cfg(unix)]
            {
                let perms = fs::Permissions::from_mode(0o600);
                fs::set_permissions(&temp_path, perms)?;
            }

            file.write_all(&json)?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.path)?;

        tracing::info!(
            op = "profile_store.save",
            profile_id = %profile.profile_id,
            "Profile saved"
        );

        Ok(())
    }

    /// Remove the stored profile, if any
    pub fn delete(&self) -> anyhow::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            tracing::info!(op = "profile_store.delete", "Stored profile deleted");
        }
        Ok(())
    }
}
