use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use uuid::Uuid;

/// Who this pet belongs to, as far as the leaderboard is concerned.
/// Provisioned once on first run and stable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

impl Identity {
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read identity from {}", path.display()))?;
            if let Ok(identity) = serde_json::from_str(&contents) {
                return Ok(identity);
            }
            // Unreadable identity file: fall through and provision a new one.
        }

        let user_id = Uuid::new_v4().to_string()[..8].to_string();
        let username = format!(
            "Dino_{}_{}",
            std::env::var("USER").unwrap_or_else(|_| "friend".into()),
            &user_id[..4]
        );
        let identity = Identity { user_id, username };

        let serialized = serde_json::to_string_pretty(&identity)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write identity to {}", path.display()))?;
        Ok(identity)
    }
}
