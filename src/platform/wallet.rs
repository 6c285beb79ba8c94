//! Wallet provider capability
//!
//! The browser injects a wallet object (`window.phantom.solana` or
//! `window.solana`); everything else in the crate sees it only through
//! `WalletProvider`. A missing provider is an ordinary, recoverable state.

use std::cell::Cell;
use std::fmt;

use crate::persistence::ledger::short_address;

/// Failures connecting to a wallet
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("No wallet provider found")]
    ProviderMissing,
    #[error("Wallet has not trusted this site yet")]
    NotTrusted,
    #[error("Connection rejected: {0}")]
    Rejected(String),
}

impl WalletError {
    /// Short text for the HUD status line
    pub fn status_text(&self) -> &'static str {
        match self {
            WalletError::ProviderMissing => "Wallet not found",
            WalletError::NotTrusted => "Wallet not connected",
            WalletError::Rejected(_) => "Connection rejected",
        }
    }
}

/// A connected wallet's public address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for status text
    pub fn short(&self) -> String {
        short_address(&self.0)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connect/disconnect capability of an injected wallet
#[allow(async_fn_in_trait)]
pub trait WalletProvider {
    /// Interactive connect (the wallet may show its own prompt)
    async fn connect(&self) -> Result<WalletAddress, WalletError>;

    /// Silent reconnect, only succeeds if the user trusted this site before
    async fn connect_trusted(&self) -> Result<WalletAddress, WalletError>;

    async fn disconnect(&self);
}

/// Provider for hosts without a wallet
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWallet;

impl WalletProvider for NoWallet {
    async fn connect(&self) -> Result<WalletAddress, WalletError> {
        Err(WalletError::ProviderMissing)
    }

    async fn connect_trusted(&self) -> Result<WalletAddress, WalletError> {
        Err(WalletError::ProviderMissing)
    }

    async fn disconnect(&self) {}
}

/// Scripted provider for native runs and tests
#[derive(Debug)]
pub struct StubWallet {
    address: WalletAddress,
    trusted: bool,
    reject: bool,
    connected: Cell<bool>,
}

impl StubWallet {
    /// Wallet that approves interactive connects; `trusted` allows silent reconnects
    pub fn new(address: &str, trusted: bool) -> Self {
        Self {
            address: WalletAddress::new(address),
            trusted,
            reject: false,
            connected: Cell::new(false),
        }
    }

    /// Wallet whose user declines every prompt
    pub fn rejecting(address: &str) -> Self {
        Self {
            reject: true,
            ..Self::new(address, false)
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }
}

impl WalletProvider for StubWallet {
    async fn connect(&self) -> Result<WalletAddress, WalletError> {
        if self.reject {
            return Err(WalletError::Rejected("User rejected the request".to_string()));
        }
        self.connected.set(true);
        Ok(self.address.clone())
    }

    async fn connect_trusted(&self) -> Result<WalletAddress, WalletError> {
        if !self.trusted {
            return Err(WalletError::NotTrusted);
        }
        self.connected.set(true);
        Ok(self.address.clone())
    }

    async fn disconnect(&self) {
        self.connected.set(false);
    }
}

/// The wallet object injected into the page
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectedWallet;

#[cfg(target_arch = "wasm32")]
mod injected {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen(inline_js = "
        function provider() {
            if (window.phantom && window.phantom.solana) return window.phantom.solana;
            if (window.solana) return window.solana;
            return null;
        }

        export function wallet_available() {
            return provider() !== null;
        }

        export async function wallet_connect(only_if_trusted) {
            const p = provider();
            if (!p) throw new Error('provider-missing');
            const resp = only_if_trusted
                ? await p.connect({ onlyIfTrusted: true })
                : await p.connect();
            return resp.publicKey.toString();
        }

        export async function wallet_disconnect() {
            const p = provider();
            if (p) await p.disconnect();
        }
    ")]
    extern "C" {
        pub fn wallet_available() -> bool;
        #[wasm_bindgen(catch)]
        pub async fn wallet_connect(only_if_trusted: bool) -> Result<JsValue, JsValue>;
        #[wasm_bindgen(catch)]
        pub async fn wallet_disconnect() -> Result<JsValue, JsValue>;
    }
}

#[cfg(target_arch = "wasm32")]
impl InjectedWallet {
    async fn connect_with(&self, only_if_trusted: bool) -> Result<WalletAddress, WalletError> {
        if !injected::wallet_available() {
            return Err(WalletError::ProviderMissing);
        }
        match injected::wallet_connect(only_if_trusted).await {
            Ok(value) => value
                .as_string()
                .map(WalletAddress::new)
                .ok_or_else(|| WalletError::Rejected("Wallet returned no address".to_string())),
            Err(_) if only_if_trusted => Err(WalletError::NotTrusted),
            Err(e) => Err(WalletError::Rejected(format!("{:?}", e))),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl WalletProvider for InjectedWallet {
    async fn connect(&self) -> Result<WalletAddress, WalletError> {
        self.connect_with(false).await
    }

    async fn connect_trusted(&self) -> Result<WalletAddress, WalletError> {
        self.connect_with(true).await
    }

    async fn disconnect(&self) {
        if let Err(e) = injected::wallet_disconnect().await {
            log::warn!("Wallet disconnect failed: {:?}", e);
        }
    }
}

/// What to offer the player when no wallet provider is present
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallHint {
    /// Desktop: link to the extension download page
    Install(String),
    /// Mobile: reopen this page inside the wallet's in-app browser
    DeepLink(String),
}

impl InstallHint {
    pub fn url(&self) -> &str {
        match self {
            InstallHint::Install(url) | InstallHint::DeepLink(url) => url,
        }
    }
}

/// Pick an install link or a mobile deep link for a missing provider
pub fn install_hint(
    user_agent: &str,
    page_url: &str,
    install_url: &str,
    deep_link_prefix: &str,
) -> InstallHint {
    if super::is_mobile_user_agent(user_agent) {
        let origin = super::url_origin(page_url);
        InstallHint::DeepLink(format!(
            "{}{}?ref={}",
            deep_link_prefix,
            super::encode_uri_component(page_url),
            super::encode_uri_component(origin)
        ))
    } else {
        InstallHint::Install(install_url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    #[test]
    fn test_no_wallet_is_missing() {
        let wallet = NoWallet;
        assert_eq!(
            pollster::block_on(wallet.connect()),
            Err(WalletError::ProviderMissing)
        );
        assert_eq!(
            pollster::block_on(wallet.connect_trusted()),
            Err(WalletError::ProviderMissing)
        );
    }

    #[test]
    fn test_stub_trusted_reconnect() {
        let trusted = StubWallet::new(ADDRESS, true);
        let address = pollster::block_on(trusted.connect_trusted()).unwrap();
        assert_eq!(address.as_str(), ADDRESS);
        assert!(trusted.is_connected());
        pollster::block_on(trusted.disconnect());
        assert!(!trusted.is_connected());

        let untrusted = StubWallet::new(ADDRESS, false);
        assert_eq!(
            pollster::block_on(untrusted.connect_trusted()),
            Err(WalletError::NotTrusted)
        );
        assert!(pollster::block_on(untrusted.connect()).is_ok());
    }

    #[test]
    fn test_rejecting_wallet() {
        let wallet = StubWallet::rejecting(ADDRESS);
        let err = pollster::block_on(wallet.connect()).unwrap_err();
        assert_eq!(err.status_text(), "Connection rejected");
        assert!(!wallet.is_connected());
    }

    #[test]
    fn test_install_hint_desktop() {
        let hint = install_hint(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0",
            "https://game.example/play",
            "https://phantom.app/download",
            "https://phantom.app/ul/browse/",
        );
        assert_eq!(hint, InstallHint::Install("https://phantom.app/download".to_string()));
    }

    #[test]
    fn test_install_hint_mobile_deep_link() {
        let hint = install_hint(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148",
            "https://game.example/play",
            "https://phantom.app/download",
            "https://phantom.app/ul/browse/",
        );
        assert_eq!(
            hint.url(),
            "https://phantom.app/ul/browse/https%3A%2F%2Fgame.example%2Fplay?ref=https%3A%2F%2Fgame.example"
        );
    }
}
