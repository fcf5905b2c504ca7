use crate::connector::Connector;
use crate::entities::{Post, User};
use crate::error::OrmResult;
use crate::model::{Entity, EntityConfig};

crate::entity! {
    pub struct Comment {
        config: EntityConfig::new("comment")
            .with_table("comments")
            .with_fillable(&["post_id", "user_id", "content", "status"]),
        relations: [post, user],
    }
}

impl Comment {
    pub async fn post(&self, conn: &impl Connector) -> OrmResult<Option<Post>> {
        self.belongs_to(conn, Some("post_id"), None).await
    }

    pub async fn user(&self, conn: &impl Connector) -> OrmResult<Option<User>> {
        self.belongs_to(conn, Some("user_id"), None).await
    }
}
