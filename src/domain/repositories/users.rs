use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::users::UserEntity;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>>;
}
