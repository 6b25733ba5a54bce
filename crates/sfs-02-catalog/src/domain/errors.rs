//! Catalog error types.

use super::submission::SubmissionErrors;
use shared_types::{BackendError, ItemId, UserId};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The draft failed field validation.
    #[error("Invalid submission: {0}")]
    Validation(SubmissionErrors),

    /// The action needs a signed-in user.
    #[error("Sign-in required")]
    SignInRequired,

    /// Only the owner may delete a material.
    #[error("Unauthorized: {user} can only delete their own materials (material {material})")]
    Forbidden { material: ItemId, user: UserId },

    #[error("Material not found: {0}")]
    NotFound(ItemId),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
