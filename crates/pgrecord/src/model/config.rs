use std::borrow::Cow;

/// Static per-type metadata: table, key and mass-assignment rules.
///
/// Built in `const` context so each entity type can keep its configuration
/// in a `static`:
///
/// ```ignore
/// const USER: EntityConfig = EntityConfig::new("user")
///     .with_table("users")
///     .with_fillable(&["name", "email"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityConfig {
    name: &'static str,
    table: Option<&'static str>,
    primary_key: &'static str,
    fillable: &'static [&'static str],
    guarded: &'static [&'static str],
}

impl EntityConfig {
    /// `name` is the lowercase singular type name (`"user"`).
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            table: None,
            primary_key: "id",
            fillable: &[],
            guarded: &[],
        }
    }

    pub const fn with_table(self, table: &'static str) -> Self {
        Self {
            table: Some(table),
            ..self
        }
    }

    pub const fn with_primary_key(self, primary_key: &'static str) -> Self {
        Self {
            primary_key,
            ..self
        }
    }

    pub const fn with_fillable(self, fillable: &'static [&'static str]) -> Self {
        Self { fillable, ..self }
    }

    pub const fn with_guarded(self, guarded: &'static [&'static str]) -> Self {
        Self { guarded, ..self }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The explicit table, or the name with an `s` appended.
    pub fn table(&self) -> Cow<'static, str> {
        match self.table {
            Some(table) => Cow::Borrowed(table),
            None => Cow::Owned(format!("{}s", self.name)),
        }
    }

    pub fn primary_key(&self) -> &'static str {
        self.primary_key
    }

    pub fn fillable(&self) -> &'static [&'static str] {
        self.fillable
    }

    pub fn guarded(&self) -> &'static [&'static str] {
        self.guarded
    }

    /// Default foreign key pointing at this type: `<name>_id`.
    pub fn foreign_key(&self) -> String {
        format!("{}_id", self.name)
    }

    /// Default pivot table between two types: both names sorted and joined by `_`.
    pub fn joining_table(&self, other: &EntityConfig) -> String {
        let mut names = [self.name, other.name];
        names.sort_unstable();
        names.join("_")
    }

    /// Whether `key` may be set through `fill()`.
    ///
    /// A `*` in `guarded` blocks everything. Otherwise a non-empty fillable
    /// list is a whitelist, and an empty one lets through every key that is
    /// not guarded.
    pub fn permits(&self, key: &str) -> bool {
        if self.guarded.contains(&"*") {
            return false;
        }
        if !self.fillable.is_empty() {
            return self.fillable.contains(&key);
        }
        !self.guarded.contains(&key)
    }
}
