//! Authentication module
//!
//! Sign-in, sessions and refresh are handled by the managed auth provider.
//! The server verifies the provider's access tokens and nothing more.

mod jwt;

pub use jwt::{
    generate_access_token, verify_token, AppMetadata, Claims, JwtError, TokenVerifier,
    AUTHENTICATED_AUDIENCE,
};
