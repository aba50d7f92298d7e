//! Persistence collaborator for user data.

use async_trait::async_trait;

use super::UserData;
use crate::error::Result;

/// Synced key-value storage holding the installation's user data.
///
/// Implementations are eventually consistent; there is no transactional
/// guarantee between a `get` and a later `set`.
#[async_trait]
pub trait UserDataRepository: Send + Sync {
    /// Returns the stored user data, or `None` before the first refresh.
    async fn get(&self) -> Result<Option<UserData>>;

    /// Replaces the stored user data.
    async fn set(&self, user_data: UserData) -> Result<()>;
}
