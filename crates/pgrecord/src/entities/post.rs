use crate::connector::Connector;
use crate::entities::{Comment, Tag, User};
use crate::error::OrmResult;
use crate::model::{Entity, EntityConfig};
use crate::qb::QueryBuilder;

crate::entity! {
    pub struct Post {
        config: EntityConfig::new("post")
            .with_table("posts")
            .with_fillable(&["title", "content", "user_id", "status", "published_at"]),
        relations: [user, comments, tags],
    }
}

impl Post {
    pub async fn user(&self, conn: &impl Connector) -> OrmResult<Option<User>> {
        self.belongs_to(conn, Some("user_id"), None).await
    }

    pub async fn comments(&self, conn: &impl Connector) -> OrmResult<Vec<Comment>> {
        self.has_many(conn, Some("post_id"), None).await
    }

    pub async fn tags(&self, conn: &impl Connector) -> OrmResult<Vec<Tag>> {
        self.belongs_to_many(conn, Some("post_tags"), Some("post_id"), Some("tag_id"))
            .await
    }

    pub fn published() -> QueryBuilder {
        Self::where_eq("status", "published")
    }

    /// Newest first by `published_at`.
    pub fn recent() -> QueryBuilder {
        Self::query().order_by_desc("published_at")
    }
}
