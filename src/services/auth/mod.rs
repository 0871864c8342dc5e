pub mod callback;
pub mod discovery;
pub mod loopback;
pub mod pkce;
pub mod token_client;
pub mod types;

pub use callback::CallbackParams;
pub use loopback::LoopbackReceiver;
pub use token_client::{
    AuthorizationRequest, BeginLogin, OAuthSettings, PendingLogin, ProviderEndpoints, TokenExchangeClient,
    TokenSet,
};
pub use types::{AccessToken, UserClaims};
