use std::path::Path;
use std::sync::Arc;

use comicshelf_core::{
    AccountService, Authenticator, CatalogService, Config, SanitizedConfig, TokenIssuer,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    token_issuer: Option<Arc<TokenIssuer>>,
    accounts: Option<Arc<AccountService>>,
    catalog: Arc<CatalogService>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        token_issuer: Option<Arc<TokenIssuer>>,
        accounts: Option<Arc<AccountService>>,
        catalog: Arc<CatalogService>,
    ) -> Self {
        Self {
            config,
            authenticator,
            token_issuer,
            accounts,
            catalog,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Present only when login is enabled (token auth).
    pub fn token_issuer(&self) -> Option<&TokenIssuer> {
        self.token_issuer.as_deref()
    }

    /// Token issuer and account store, when login and registration are enabled.
    pub fn login_services(&self) -> Option<(&TokenIssuer, &AccountService)> {
        Some((self.token_issuer.as_deref()?, self.accounts.as_deref()?))
    }

    pub fn catalog(&self) -> &CatalogService {
        self.catalog.as_ref()
    }

    /// Directory served under the public cover prefix.
    pub fn storage_root(&self) -> &Path {
        &self.config.storage.root
    }
}
