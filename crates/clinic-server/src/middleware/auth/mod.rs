//! Authentication middleware for the clinic API server.

pub mod extractor;
pub mod jwt;
pub mod layer;
pub mod types;

pub use extractor::{Auth, MaybeAuth};
pub use jwt::{decode_token, encode_token, TokenDecoder};
pub use layer::{AuthLayer, AuthMiddleware};
pub use types::{AuthUser, Claims, TokenType};
