pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod metrics;
pub mod storage;
pub mod testing;

pub use accounts::{
    create_account_service, AccountError, AccountService, RegisterRequest, SqliteUserStore,
    UserAccount, UserStore,
};
pub use auth::{
    create_authenticator, create_token_issuer, ApiKeyAuthenticator, AuthError, AuthRequest,
    Authenticator, Identity, IssuedToken, NoneAuthenticator, Role, TokenAuthenticator,
    TokenIssuer,
};
pub use catalog::{
    CatalogError, CatalogItem, CatalogService, ItemRequest, ItemStatus, ItemStore, SearchFilter,
    SqliteItemStore,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use storage::{AssetLifecycle, AssetStorage, CoverUpload, FsAssetStorage, StorageError};
