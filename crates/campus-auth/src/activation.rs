//! Portal activation — linking a tenant profile to a new global
//! identity.
//!
//! Admission creates profiles with no identity at all; activation is the
//! moment a person gains login access. Local-alias allocation, global
//! username derivation, identity creation, and profile linking are one
//! unit from the caller's perspective: a uniqueness violation reported
//! by the store at insert time (two concurrent activations racing for
//! the same name) throws the whole allocation away and re-runs it, a
//! bounded number of times.

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::identity::{CreateIdentity, Identity};
use campus_core::models::profile::Profile;
use campus_core::repository::{IdentityRepository, ProfileRepository};
use campus_core::tenant::TenantScope;
use tracing::warn;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::username::UsernameAllocator;

/// Input for portal activation.
#[derive(Debug, Clone)]
pub struct ActivateProfile {
    pub profile_id: Uuid,
    /// Requested tenant-local alias; a numeric suffix is appended on
    /// collision.
    pub base_username: String,
    /// Initial credential, retained as displayable until rotated.
    pub initial_password: String,
    pub email: Option<String>,
}

/// Successful activation result.
#[derive(Debug)]
pub struct ActivationOutput {
    pub identity: Identity,
    pub profile: Profile,
}

pub struct PortalActivation<'a, I, P> {
    identity_repo: &'a I,
    profile_repo: &'a P,
    config: &'a AuthConfig,
}

impl<'a, I: IdentityRepository, P: ProfileRepository> PortalActivation<'a, I, P> {
    pub fn new(identity_repo: &'a I, profile_repo: &'a P, config: &'a AuthConfig) -> Self {
        Self {
            identity_repo,
            profile_repo,
            config,
        }
    }

    /// Allocate usernames, create the identity, and link the profile.
    ///
    /// The created identity carries `needs_password_rotation` and the
    /// displayable initial credential; both are cleared by
    /// [`rotate_password`](Self::rotate_password).
    pub async fn activate(
        &self,
        scope: &TenantScope,
        input: ActivateProfile,
    ) -> CampusResult<ActivationOutput> {
        if input.initial_password.len() < self.config.min_password_length {
            return Err(CampusError::Validation {
                field: "initial_password".into(),
                message: format!(
                    "must be at least {} characters",
                    self.config.min_password_length
                ),
            });
        }

        let profile = self.profile_repo.get_by_id(scope, input.profile_id).await?;
        if profile.identity_ref.is_some() {
            return Err(CampusError::Conflict {
                entity: "profile".into(),
            });
        }

        let allocator = UsernameAllocator::new(self.identity_repo, self.profile_repo, self.config);

        for attempt in 1..=self.config.max_allocation_retries {
            let local_username = allocator.allocate_local(scope, &input.base_username).await?;
            let global_username = allocator.allocate_global(&local_username).await?;

            let identity = match self
                .identity_repo
                .create(CreateIdentity {
                    username: global_username,
                    email: input.email.clone(),
                    password: input.initial_password.clone(),
                    needs_password_rotation: true,
                })
                .await
            {
                Ok(identity) => identity,
                Err(e) if e.is_conflict() => {
                    warn!(
                        tenant = %scope.schema_name,
                        attempt,
                        "identity insert lost a uniqueness race, reallocating"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self
                .profile_repo
                .link_identity(scope, input.profile_id, identity.id, &local_username)
                .await
            {
                Ok(profile) => return Ok(ActivationOutput { identity, profile }),
                Err(e) if e.is_conflict() => {
                    // The local alias was taken between check and link.
                    // Remove the identity created above and start over.
                    self.identity_repo.delete(identity.id).await?;
                    warn!(
                        tenant = %scope.schema_name,
                        attempt,
                        "profile link lost a uniqueness race, reallocating"
                    );
                    continue;
                }
                Err(e) => {
                    self.identity_repo.delete(identity.id).await?;
                    return Err(e);
                }
            }
        }

        Err(CampusError::AllocationExhausted {
            base: input.base_username,
        })
    }

    /// Self-service credential rotation: re-hashes the password and
    /// clears both transient onboarding fields.
    pub async fn rotate_password(
        &self,
        identity_id: Uuid,
        new_password: &str,
    ) -> CampusResult<Identity> {
        if new_password.len() < self.config.min_password_length {
            return Err(CampusError::Validation {
                field: "new_password".into(),
                message: format!(
                    "must be at least {} characters",
                    self.config.min_password_length
                ),
            });
        }

        self.identity_repo
            .rotate_password(identity_id, new_password)
            .await
    }
}
