//! Remote account API boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::user::{Preferences, UserData};

#[async_trait]
pub trait UserDataApi: Send + Sync {
    /// Downloads the full user data for `token`.
    async fn fetch_user_data(&self, token: &str) -> Result<UserData>;

    /// Stores `preferences` on the account.
    async fn save_preferences(&self, token: &str, preferences: &Preferences) -> Result<()>;
}
