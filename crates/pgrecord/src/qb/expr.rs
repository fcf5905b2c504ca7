//! Clause nodes: WHERE predicates, joins and ordering terms.

use std::fmt;

/// Boolean connective placed before a predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boolean {
    And,
    Or,
}

impl Boolean {
    pub fn as_sql(self) -> &'static str {
        match self {
            Boolean::And => "AND",
            Boolean::Or => "OR",
        }
    }
}

/// A single WHERE predicate. Values live in the builder's bindings; a
/// predicate only references them by placeholder name.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// `column op :placeholder`
    Basic {
        column: String,
        operator: String,
        placeholder: String,
        boolean: Boolean,
    },
    /// `column IN (:p0, :p1, ...)`
    In {
        column: String,
        placeholders: Vec<String>,
        boolean: Boolean,
    },
}

impl Predicate {
    pub fn boolean(&self) -> Boolean {
        match self {
            Predicate::Basic { boolean, .. } | Predicate::In { boolean, .. } => *boolean,
        }
    }

    /// Render without the leading boolean keyword.
    fn render_body(&self) -> String {
        match self {
            Predicate::Basic {
                column,
                operator,
                placeholder,
                ..
            } => format!("{column} {operator} {placeholder}"),
            // An empty list can never match; `IN ()` is not valid PostgreSQL.
            Predicate::In { placeholders, .. } if placeholders.is_empty() => "1 = 0".to_string(),
            Predicate::In {
                column,
                placeholders,
                ..
            } => format!("{column} IN ({})", placeholders.join(", ")),
        }
    }
}

/// Render predicates joined by single spaces; the first one omits its boolean.
pub(crate) fn render_predicates(wheres: &[Predicate]) -> String {
    wheres
        .iter()
        .enumerate()
        .map(|(idx, predicate)| {
            if idx == 0 {
                predicate.render_body()
            } else {
                format!("{} {}", predicate.boolean().as_sql(), predicate.render_body())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
        }
    }
}

/// `<KIND> JOIN table ON left op right`
#[derive(Clone, Debug, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub left: String,
    pub operator: String,
    pub right: String,
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} JOIN {} ON {} {} {}",
            self.kind.as_sql(),
            self.table,
            self.left,
            self.operator,
            self.right
        )
    }
}

/// An ORDER BY term. The direction is kept as given and upper-cased on render.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: String,
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.direction.to_uppercase())
    }
}
