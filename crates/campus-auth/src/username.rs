//! Two-tier username allocation.
//!
//! Local usernames are human-chosen aliases unique only inside one
//! tenant partition; global usernames are what the identity pool
//! actually stores credentials under. Both allocations check uniqueness
//! before insert, so a concurrent allocation for the same base can slip
//! past the check — the store's unique index catches it at insert time
//! and [`crate::activation::PortalActivation`] retries from scratch.

use campus_core::error::{CampusError, CampusResult};
use campus_core::repository::{IdentityRepository, ProfileRepository};
use campus_core::tenant::TenantScope;
use rand::Rng;

use crate::config::AuthConfig;

/// Longest accepted base alias.
const MAX_LOCAL_USERNAME_LEN: usize = 64;

/// Upper bound on numeric suffix probing for local aliases.
const MAX_LOCAL_SUFFIX: u32 = 1000;

/// Validate a requested base alias: lowercase ASCII alphanumerics plus
/// `.`, `_`, `-`, starting with a letter or digit.
pub fn validate_base(base: &str) -> CampusResult<()> {
    if base.is_empty() {
        return Err(CampusError::Validation {
            field: "local_username".into(),
            message: "must not be empty".into(),
        });
    }
    if base.len() > MAX_LOCAL_USERNAME_LEN {
        return Err(CampusError::Validation {
            field: "local_username".into(),
            message: format!("must be at most {MAX_LOCAL_USERNAME_LEN} characters"),
        });
    }
    if !base
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
    {
        return Err(CampusError::Validation {
            field: "local_username".into(),
            message: "only lowercase letters, digits, '.', '_' and '-' are allowed".into(),
        });
    }
    if !base
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(CampusError::Validation {
            field: "local_username".into(),
            message: "must start with a letter or digit".into(),
        });
    }
    Ok(())
}

/// Six lowercase hex characters for the global-username suffix.
fn random_suffix() -> String {
    let mut rng = rand::rng();
    let n: u32 = rng.random_range(0..0x0100_0000);
    format!("{n:06x}")
}

/// Allocates tenant-local aliases and globally unique usernames.
///
/// Generic over repository implementations so the auth layer has no
/// dependency on the database crate.
pub struct UsernameAllocator<'a, I, P> {
    identity_repo: &'a I,
    profile_repo: &'a P,
    config: &'a AuthConfig,
}

impl<'a, I: IdentityRepository, P: ProfileRepository> UsernameAllocator<'a, I, P> {
    pub fn new(identity_repo: &'a I, profile_repo: &'a P, config: &'a AuthConfig) -> Self {
        Self {
            identity_repo,
            profile_repo,
            config,
        }
    }

    /// Allocate a tenant-local alias from a requested base.
    ///
    /// Returns the base itself when free, otherwise the first free
    /// `base2`, `base3`, ... (never `base1` — the bare base *is* the
    /// first allocation).
    pub async fn allocate_local(&self, scope: &TenantScope, base: &str) -> CampusResult<String> {
        validate_base(base)?;

        if !self.profile_repo.local_username_exists(scope, base).await? {
            return Ok(base.to_string());
        }

        for n in 2..MAX_LOCAL_SUFFIX {
            let candidate = format!("{base}{n}");
            if !self
                .profile_repo
                .local_username_exists(scope, &candidate)
                .await?
            {
                return Ok(candidate);
            }
        }

        Err(CampusError::AllocationExhausted { base: base.into() })
    }

    /// Derive a globally unique username from a local alias:
    /// `<local>_<6 lowercase hex chars>`, regenerated with fresh random
    /// suffixes until free in the identity pool.
    pub async fn allocate_global(&self, local_username: &str) -> CampusResult<String> {
        for _ in 0..self.config.max_global_suffix_attempts {
            let candidate = format!("{local_username}_{}", random_suffix());
            if !self.identity_repo.username_exists(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(CampusError::AllocationExhausted {
            base: local_username.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_aliases() {
        assert!(validate_base("jdoe").is_ok());
        assert!(validate_base("j.doe-2").is_ok());
        assert!(validate_base("7santos_jr").is_ok());
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(validate_base("").is_err());
        assert!(validate_base(&"a".repeat(65)).is_err());
    }

    #[test]
    fn rejects_uppercase_and_symbols() {
        assert!(validate_base("JDoe").is_err());
        assert!(validate_base("jdoe!").is_err());
        assert!(validate_base("j doe").is_err());
    }

    #[test]
    fn rejects_leading_separator() {
        assert!(validate_base(".jdoe").is_err());
        assert!(validate_base("-jdoe").is_err());
    }

    #[test]
    fn suffix_is_six_lowercase_hex_chars() {
        for _ in 0..32 {
            let s = random_suffix();
            assert_eq!(s.len(), 6);
            assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }
}
