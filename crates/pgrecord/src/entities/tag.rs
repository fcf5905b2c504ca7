use crate::connector::Connector;
use crate::entities::Post;
use crate::error::OrmResult;
use crate::model::{Entity, EntityConfig};

crate::entity! {
    pub struct Tag {
        config: EntityConfig::new("tag")
            .with_table("tags")
            .with_fillable(&["name", "slug"]),
        relations: [posts],
    }
}

impl Tag {
    pub async fn posts(&self, conn: &impl Connector) -> OrmResult<Vec<Post>> {
        self.belongs_to_many(conn, Some("post_tags"), Some("tag_id"), Some("post_id"))
            .await
    }
}
