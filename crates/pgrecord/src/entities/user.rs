use crate::connector::Connector;
use crate::entities::{Post, Profile, Role};
use crate::error::OrmResult;
use crate::model::{Entity, EntityConfig, HasAttributes};
use crate::qb::QueryBuilder;

crate::entity! {
    /// A registered account.
    pub struct User {
        config: EntityConfig::new("user")
            .with_table("users")
            .with_fillable(&["id", "name", "email", "password", "age", "status"]),
        relations: [posts, profile, roles],
    }
}

impl User {
    pub async fn posts(&self, conn: &impl Connector) -> OrmResult<Vec<Post>> {
        self.has_many(conn, Some("user_id"), None).await
    }

    pub async fn profile(&self, conn: &impl Connector) -> OrmResult<Option<Profile>> {
        self.has_one(conn, Some("user_id"), None).await
    }

    pub async fn roles(&self, conn: &impl Connector) -> OrmResult<Vec<Role>> {
        self.belongs_to_many(conn, Some("user_roles"), Some("user_id"), Some("role_id"))
            .await
    }

    /// Users with status `active`.
    pub fn active() -> QueryBuilder {
        Self::where_eq("status", "active")
    }

    /// Users strictly older than `age`.
    pub fn older_than(age: i64) -> QueryBuilder {
        Self::where_op("age", ">", age)
    }

    pub fn full_name(&self) -> Option<&str> {
        self.get_attribute("name").and_then(|name| name.as_str())
    }
}
