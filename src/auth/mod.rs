//! Identity: accounts, password checks and bearer sessions.

mod error;
pub mod service;
pub mod types;

pub use error::AuthError;
pub use service::IdentityService;
pub use types::{
    AuthResponse, LoginRequest, NewUser, Principal, RegisterRequest, Role, User, UserId,
};
