//! Request-key composition
//!
//! Cache entries are addressed by string keys composed from the identifying
//! parameters of a request (e.g. database + table name). Composition must be
//! injective: two different parameter tuples must never produce the same key,
//! even when a parameter contains the delimiter itself.

/// Delimiter between key parts.
const DELIMITER: char = '/';

/// Escape character used to make the delimiter safe inside parts.
const ESCAPE: char = '\\';

/// Compose a request key from an ordered sequence of parts.
///
/// Deterministic and injective: the delimiter and escape character are
/// escaped inside each part, so distinct tuples cannot alias.
///
/// # Examples
///
/// ```
/// use clusterboard_core::key::compose_key;
///
/// assert_eq!(compose_key(&["db1", "users"]), "db1/users");
/// assert_ne!(compose_key(&["a/b", "c"]), compose_key(&["a", "b/c"]));
/// ```
pub fn compose_key(parts: &[&str]) -> String {
    let mut key = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(DELIMITER);
        }
        for c in part.chars() {
            if c == DELIMITER || c == ESCAPE {
                key.push(ESCAPE);
            }
            key.push(c);
        }
    }
    key
}

/// Compose the key identifying a table within a database.
///
/// Used by the `table_details` and `table_stats` resource kinds.
pub fn table_key(database: &str, table: &str) -> String {
    compose_key(&[database, table])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_tuples_yield_equal_keys() {
        assert_eq!(compose_key(&["db", "t"]), compose_key(&["db", "t"]));
        assert_eq!(table_key("db", "t"), compose_key(&["db", "t"]));
    }

    #[test]
    fn test_distinct_tuples_never_collide() {
        let pairs = [
            (["a/b", "c"], ["a", "b/c"]),
            (["a", "b"], ["a/b", ""]),
            (["a\\", "b"], ["a", "\\b"]),
            (["a\\/b", "c"], ["a", "b/c"]),
            (["", "a"], ["a", ""]),
        ];
        for (left, right) in pairs {
            assert_ne!(
                compose_key(&left),
                compose_key(&right),
                "collision for {:?} vs {:?}",
                left,
                right
            );
        }
    }

    #[test]
    fn test_empty_parts() {
        assert_eq!(compose_key(&["", ""]), "/");
        assert_eq!(compose_key(&[""]), "");
        assert_ne!(compose_key(&[""]), compose_key(&["", ""]));
    }

    #[test]
    fn test_delimiter_in_part_is_escaped() {
        assert_eq!(compose_key(&["a/b", "c"]), "a\\/b/c");
        assert_eq!(compose_key(&["a", "b/c"]), "a/b\\/c");
    }

    #[test]
    fn test_escape_char_in_part_is_escaped() {
        assert_eq!(compose_key(&["a\\", "b"]), "a\\\\/b");
    }
}
