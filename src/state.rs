// src/state.rs
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::ct_log::SignedTreeHead;

/// Last verified tree head per CT log
/// Persisted to a TOML file so the next run can prove consistency against it
pub struct StateManager {
    state_file_path: PathBuf,
    state: Mutex<HashMap<String, SignedTreeHead>>,
}

impl StateManager {
    /// Create new state manager and load existing state from file
    pub async fn new(state_file: PathBuf) -> Result<Self> {
        let mut state = HashMap::new();

        if state_file.exists() {
            info!("Loading state from {:?}", state_file);

            let contents = fs::read_to_string(&state_file)
                .await
                .context("Failed to read state file")?;

            let loaded_state: HashMap<String, SignedTreeHead> =
                toml::from_str(&contents).context("Failed to parse state file")?;

            info!("Loaded state for {} CT logs", loaded_state.len());
            state = loaded_state;
        } else {
            info!("State file {:?} does not exist, starting fresh", state_file);
        }

        Ok(Self {
            state_file_path: state_file,
            state: Mutex::new(state),
        })
    }

    /// Last verified tree head for a CT log
    pub async fn get_sth(&self, log_url: &str) -> Option<SignedTreeHead> {
        let state = self.state.lock().await;
        state.get(log_url).cloned()
    }

    /// Record a newly verified tree head; call [`StateManager::save`] to persist it
    pub async fn set_sth(&self, log_url: &str, sth: SignedTreeHead) {
        let mut state = self.state.lock().await;
        state.insert(log_url.to_string(), sth);
    }

    /// Save state to file
    pub async fn save(&self) -> Result<()> {
        let state = self.state.lock().await;

        debug!("Saving state for {} CT logs to {:?}", state.len(), self.state_file_path);

        let toml_string =
            toml::to_string(&*state).context("Failed to serialize state to TOML")?;

        // Write to temporary file first, then rename for atomicity
        let temp_path = self.state_file_path.with_extension("tmp");

        fs::write(&temp_path, toml_string)
            .await
            .context("Failed to write state to temporary file")?;

        fs::rename(&temp_path, &self.state_file_path)
            .await
            .context("Failed to rename temporary state file")?;

        debug!("State saved successfully");

        Ok(())
    }

}
