//! Campus Auth — password verification, two-tier username allocation,
//! portal activation, and tenant-aware authentication resolution.

pub mod activation;
pub mod config;
pub mod error;
pub mod password;
pub mod resolver;
pub mod username;

pub use activation::{ActivateProfile, ActivationOutput, PortalActivation};
pub use config::AuthConfig;
pub use error::AuthError;
pub use resolver::{AuthContext, AuthenticationResolver};
pub use username::UsernameAllocator;
