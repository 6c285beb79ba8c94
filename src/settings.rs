//! Game settings and preferences
//!
//! Persisted separately from the high score in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::sim::ScoringMode;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Gameplay ===
    /// Points model for hits
    pub scoring: ScoringMode,
    /// Show the "tap when white hits green" banner at start-up
    pub show_instructions: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute all sound
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion (no shake, no glow)
    pub reduced_motion: bool,

    // === Wallet & ledger ===
    /// Remote ledger endpoint; LocalStorage ledger when unset
    pub ledger_endpoint: Option<String>,
    /// Try a silent trusted reconnect on start-up
    pub auto_reconnect_wallet: bool,
    /// Where desktop players without a wallet are sent
    pub wallet_install_url: String,
    /// Prefix that reopens a page inside the mobile wallet's browser
    pub wallet_deep_link_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scoring: ScoringMode::Classic,
            show_instructions: true,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            reduced_motion: false,

            ledger_endpoint: None,
            auto_reconnect_wallet: true,
            wallet_install_url: "https://phantom.app/download".to_string(),
            wallet_deep_link_prefix: "https://phantom.app/ul/browse/".to_string(),
        }
    }
}

impl Settings {
    /// Miss shake and hit glow (off under reduced_motion)
    pub fn effective_motion(&self) -> bool {
        !self.reduced_motion
    }

    /// Effective sound volume, 0 when muted
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Ledger endpoint if one is configured and non-blank
    pub fn ledger_endpoint(&self) -> Option<&str> {
        self.ledger_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Parse settings JSON, falling back to defaults for anything missing or broken
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring unreadable settings: {}", e);
                Self::default()
            }
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "onetaptoolate_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        match crate::persistence::WebStorage::get_raw(Self::STORAGE_KEY) {
            Some(json) => {
                log::info!("Loaded settings from LocalStorage");
                Self::from_json(&json)
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        match serde_json::to_string(self) {
            Ok(json) => match crate::persistence::WebStorage::set_raw(Self::STORAGE_KEY, &json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::warn!("Failed to save settings: {}", e),
            },
            Err(e) => log::warn!("Failed to encode settings: {}", e),
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("Using default settings ({} not available natively)", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{"scoring":"Tiered","muted":true}"#);
        assert_eq!(settings.scoring, ScoringMode::Tiered);
        assert!(settings.muted);
        assert!(settings.show_instructions);
        assert_eq!(settings.effective_volume(), 0.0);
    }

    #[test]
    fn test_broken_json_falls_back() {
        assert_eq!(Settings::from_json("{not json"), Settings::default());
    }

    #[test]
    fn test_ledger_endpoint_blank_is_none() {
        let mut settings = Settings::default();
        assert_eq!(settings.ledger_endpoint(), None);
        settings.ledger_endpoint = Some("   ".to_string());
        assert_eq!(settings.ledger_endpoint(), None);
        settings.ledger_endpoint = Some("https://ledger.example/points".to_string());
        assert_eq!(settings.ledger_endpoint(), Some("https://ledger.example/points"));
    }

    #[test]
    fn test_reduced_motion_disables_shake() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!settings.effective_motion());
    }
}
