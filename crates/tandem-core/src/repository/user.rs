//! UserRepository trait definition.

use tandem_types::error::RepositoryError;
use tandem_types::user::User;

/// Repository trait for user account persistence.
///
/// Credential hashing and verification are external concerns; the hash is an
/// opaque value here.
pub trait UserRepository: Send + Sync {
    /// Register an account, generating a unique 6-digit public code.
    fn create(
        &self,
        user_id: i64,
        credential_hash: &str,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Fetch a user by external id.
    fn get(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Resolve a public pairing code to its owner.
    fn find_by_public_code(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;
}
