use crate::connector::Connector;
use crate::entities::User;
use crate::error::OrmResult;
use crate::model::{Entity, EntityConfig};

crate::entity! {
    pub struct Profile {
        config: EntityConfig::new("profile")
            .with_table("profiles")
            .with_fillable(&["user_id", "bio", "avatar", "website", "location"]),
        relations: [user],
    }
}

impl Profile {
    pub async fn user(&self, conn: &impl Connector) -> OrmResult<Option<User>> {
        self.belongs_to(conn, Some("user_id"), None).await
    }
}
