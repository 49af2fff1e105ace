//! Tenant-aware authentication resolution.
//!
//! The same identifier can mean different things depending on where the
//! login request arrives: on a tenant portal it is first treated as a
//! tenant-local alias, on the shared portal it only ever names the
//! global identity pool. Resolution failures are deliberately uniform
//! so callers cannot distinguish "unknown identifier" from "wrong
//! password"; a disabled account is the one state reported distinctly,
//! and only after the credential verified.

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::identity::Identity;
use campus_core::repository::{IdentityRepository, ProfileRepository};
use campus_core::tenant::TenantScope;
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password::verify_password;

/// Where a login request arrived.
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// Shared portal: identifiers name the global pool directly.
    Public,
    /// Tenant portal: identifiers are tried as local aliases first.
    Tenant(TenantScope),
}

/// Resolves login identifiers to identities and verifies credentials.
pub struct AuthenticationResolver<'a, I, P> {
    identity_repo: &'a I,
    profile_repo: &'a P,
    config: &'a AuthConfig,
}

impl<'a, I: IdentityRepository, P: ProfileRepository> AuthenticationResolver<'a, I, P> {
    pub fn new(identity_repo: &'a I, profile_repo: &'a P, config: &'a AuthConfig) -> Self {
        Self {
            identity_repo,
            profile_repo,
            config,
        }
    }

    /// Resolve and authenticate in one step.
    ///
    /// Tenant contexts try the identifier as a local alias in that
    /// tenant's partition before falling back to the global pool. A
    /// local alias in *another* tenant never resolves here. Identifiers
    /// containing `@` are looked up by email on the global path.
    pub async fn resolve(
        &self,
        context: &AuthContext,
        identifier: &str,
        password: &str,
    ) -> CampusResult<Identity> {
        let identity = match context {
            AuthContext::Public => self.lookup_global(identifier).await?,
            AuthContext::Tenant(scope) => match self.lookup_local(scope, identifier).await? {
                Some(identity) => identity,
                None => self.lookup_global(identifier).await?,
            },
        };

        let matched = verify_password(
            password,
            &identity.password_hash,
            self.config.pepper.as_deref(),
        )
        .map_err(CampusError::from)?;
        if !matched {
            return Err(AuthError::InvalidCredentials.into());
        }
        if !identity.is_active {
            return Err(AuthError::AccountDisabled.into());
        }

        Ok(identity)
    }

    /// Local-alias path: profile lookup in the tenant partition, then a
    /// hop through the soft link to the global pool.
    ///
    /// Returns `Ok(None)` when the alias does not resolve to a live
    /// identity so the caller can fall back to the global path. A
    /// dangling `identity_ref` (the identity was purged but the profile
    /// survived) counts as not resolving, not as an error.
    async fn lookup_local(
        &self,
        scope: &TenantScope,
        identifier: &str,
    ) -> CampusResult<Option<Identity>> {
        let profile = match self
            .profile_repo
            .get_by_local_username(scope, identifier)
            .await
        {
            Ok(profile) => profile,
            Err(CampusError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let Some(identity_id) = profile.identity_ref else {
            return Ok(None);
        };

        match self.identity_repo.get_by_id(identity_id).await {
            Ok(identity) => Ok(Some(identity)),
            Err(CampusError::NotFound { .. }) => {
                debug!(
                    tenant = %scope.schema_name,
                    %identity_id,
                    "local alias points at a purged identity"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Global-pool path: email when the identifier looks like one,
    /// username otherwise. `NotFound` collapses into the uniform
    /// credential failure.
    async fn lookup_global(&self, identifier: &str) -> CampusResult<Identity> {
        let result = if identifier.contains('@') {
            self.identity_repo.get_by_email(identifier).await
        } else {
            self.identity_repo.get_by_username(identifier).await
        };

        match result {
            Ok(identity) => Ok(identity),
            Err(CampusError::NotFound { .. }) => Err(AuthError::InvalidCredentials.into()),
            Err(e) => Err(e),
        }
    }
}
