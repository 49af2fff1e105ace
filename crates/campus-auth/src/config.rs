//! Authentication configuration.

/// Configuration for credential verification and username allocation.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Optional pepper prepended to passwords before Argon2id
    /// verification. Must match the pepper the storage layer hashes
    /// with.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// How many fresh random suffixes the global-username step tries
    /// before giving up.
    pub max_global_suffix_attempts: u32,
    /// How many times activation re-runs the whole allocation after a
    /// uniqueness race at insert time.
    pub max_allocation_retries: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pepper: None,
            min_password_length: 8,
            max_global_suffix_attempts: 5,
            max_allocation_retries: 3,
        }
    }
}
