/// Declare an entity type backed by a [`Model`](crate::Model).
///
/// Generates a newtype that derefs to `Model`, an [`Entity`](crate::Entity)
/// impl holding `config` in a `static`, and relation dispatch by name for
/// every method listed in `relations`. Each listed method must be an inherent
/// `async fn name(&self, conn: &impl Connector) -> OrmResult<T>` where
/// `T: Into<Relation>`.
///
/// ```ignore
/// pgrecord::entity! {
///     pub struct User {
///         config: EntityConfig::new("user").with_fillable(&["name", "email"]),
///         relations: [posts],
///     }
/// }
///
/// impl User {
///     pub async fn posts(&self, conn: &impl Connector) -> OrmResult<Vec<Post>> {
///         self.has_many(conn, Some("user_id"), None).await
///     }
/// }
/// ```
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            config: $config:expr,
            relations: [$($relation:ident),* $(,)?] $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name($crate::Model);

        impl $crate::Entity for $name {
            fn config() -> &'static $crate::EntityConfig {
                static CONFIG: $crate::EntityConfig = $config;
                &CONFIG
            }

            fn from_model(model: $crate::Model) -> Self {
                Self(model)
            }

            fn model(&self) -> &$crate::Model {
                &self.0
            }

            fn model_mut(&mut self) -> &mut $crate::Model {
                &mut self.0
            }

            fn into_model(self) -> $crate::Model {
                self.0
            }

            #[allow(unused_variables)]
            fn resolve_relation<C: $crate::Connector>(
                &self,
                conn: &C,
                name: &str,
            ) -> impl ::std::future::Future<Output = $crate::OrmResult<$crate::Relation>> + Send {
                async move {
                    $(
                        if name == stringify!($relation) {
                            return self.$relation(conn).await.map($crate::Relation::from);
                        }
                    )*
                    Err($crate::OrmError::invalid_relation(
                        name,
                        <Self as $crate::Entity>::config().name(),
                    ))
                }
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::Model;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl ::std::convert::From<$name> for $crate::Model {
            fn from(entity: $name) -> Self {
                entity.0
            }
        }
    };
}
