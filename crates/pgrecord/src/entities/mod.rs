//! The blog schema: users with profiles, posts, comments, roles and tags.
//!
//! Pivot tables are `user_roles (user_id, role_id)` and
//! `post_tags (post_id, tag_id)`.

mod comment;
mod post;
mod profile;
mod role;
mod tag;
mod user;

pub use comment::Comment;
pub use post::Post;
pub use profile::Profile;
pub use role::Role;
pub use tag::Tag;
pub use user::User;
