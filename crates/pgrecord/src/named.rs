//! Rewriting named `:placeholders` into PostgreSQL's positional `$n` form.

use std::collections::HashMap;

use crate::error::{OrmError, OrmResult};
use crate::qb::Bindings;
use crate::value::Value;

/// Rewrite `sql` so every `:name` becomes `$n`, returning the values in
/// parameter order.
///
/// A placeholder used more than once maps to the same `$n`. `::type` casts
/// and text inside single-quoted literals, double-quoted identifiers and
/// comments are left alone.
pub fn to_positional<'a>(sql: &str, bindings: &'a Bindings) -> OrmResult<(String, Vec<&'a Value>)> {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut params: Vec<&'a Value> = Vec::new();
    let mut indices: HashMap<&str, usize> = HashMap::new();
    let mut i = 0;
    let mut copied_to = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        if i + 1 < bytes.len() && bytes[i + 1] == quote {
                            i += 2; // escaped quote
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
            }
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
            }
            b':' if bytes
                .get(i + 1)
                .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') =>
            {
                let start = i;
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let name = &sql[start..i];
                let idx = match indices.get(name) {
                    Some(idx) => *idx,
                    None => {
                        let value = bindings
                            .get(name)
                            .ok_or_else(|| OrmError::MissingBinding(name.to_string()))?;
                        params.push(value);
                        indices.insert(name, params.len());
                        params.len()
                    }
                };
                out.push_str(&sql[copied_to..start]);
                out.push('$');
                out.push_str(&idx.to_string());
                copied_to = i;
            }
            _ => i += 1,
        }
    }

    out.push_str(&sql[copied_to.min(sql.len())..]);
    Ok((out, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_in_order_of_appearance() {
        let mut b = Bindings::new();
        b.bind("status", "active");
        b.bind("age", 18);
        let (sql, params) =
            to_positional("SELECT * FROM users WHERE status = :status AND age > :age", &b).unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE status = $1 AND age > $2");
        assert_eq!(params, vec![&Value::from("active"), &Value::Int(18)]);
    }

    #[test]
    fn reuses_index_for_repeated_name() {
        let mut b = Bindings::new();
        b.bind("id", 1);
        let (sql, params) = to_positional("SELECT :id, :id", &b).unwrap();
        assert_eq!(sql, "SELECT $1, $1");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn skips_casts_and_literals() {
        let mut b = Bindings::new();
        b.bind("v", "x");
        let (sql, params) =
            to_positional("SELECT ':nope', \"a:b\", :v::text -- :c\n", &b).unwrap();
        assert_eq!(sql, "SELECT ':nope', \"a:b\", $1::text -- :c\n");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn missing_binding_is_an_error() {
        let b = Bindings::new();
        let err = to_positional("SELECT * FROM t WHERE a = :a", &b).unwrap_err();
        assert!(matches!(err, OrmError::MissingBinding(name) if name == ":a"));
    }
}
