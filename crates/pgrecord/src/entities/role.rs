use crate::connector::Connector;
use crate::entities::User;
use crate::error::OrmResult;
use crate::model::{Entity, EntityConfig};

crate::entity! {
    pub struct Role {
        config: EntityConfig::new("role")
            .with_table("roles")
            .with_fillable(&["name", "description"]),
        relations: [users],
    }
}

impl Role {
    pub async fn users(&self, conn: &impl Connector) -> OrmResult<Vec<User>> {
        self.belongs_to_many(conn, Some("user_roles"), Some("role_id"), Some("user_id"))
            .await
    }
}
