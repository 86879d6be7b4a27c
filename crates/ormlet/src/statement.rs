//! Statement synthesis and placeholder handling.
//!
//! Templates always use `?` as the positional placeholder. The gateway
//! translates them to the driver's native form right before dispatch.

use std::borrow::Cow;

use crate::{OrmError, Result};

/// Longest identifier MySQL accepts.
const MAX_IDENTIFIER_LEN: usize = 64;

/// The four canonical statements derived for a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statements {
    pub select: String,
    pub insert: String,
    pub update: String,
    pub delete: String,
}

impl Statements {
    /// Synthesizes the statements for a table.
    ///
    /// Parameter order for `insert` and `update` is the non-key fields in the
    /// given order followed by the primary key.
    pub fn synthesize(table: &str, primary_key: &str, non_key_fields: &[String]) -> Self {
        let table = quote_identifier(table);
        let pk = quote_identifier(primary_key);
        let escaped: Vec<String> = non_key_fields.iter().map(|f| quote_identifier(f)).collect();

        let mut select_columns = vec![pk.clone()];
        select_columns.extend(escaped.iter().cloned());
        let select = format!("select {} from {}", select_columns.join(", "), table);

        let mut insert_columns = escaped.clone();
        insert_columns.push(pk.clone());
        let insert = format!(
            "insert into {} ({}) values ({})",
            table,
            insert_columns.join(", "),
            placeholder_list(insert_columns.len())
        );

        // A key-only table still needs a well-formed SET list
        let assignments = if escaped.is_empty() {
            format!("{}={}", pk, pk)
        } else {
            escaped.iter().map(|f| format!("{}=?", f)).collect::<Vec<_>>().join(", ")
        };
        let update = format!("update {} set {} where {}=?", table, assignments, pk);

        let delete = format!("delete from {} where {}=?", table, pk);

        Self {
            select,
            insert,
            update,
            delete,
        }
    }
}

/// Back-tick quotes an identifier, doubling embedded back-ticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Validates a table or column name.
///
/// Names are always back-tick quoted, so any non-empty name that fits
/// MySQL's identifier length is accepted.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(OrmError::Schema("Identifier cannot be empty".to_string()));
    }

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(OrmError::Schema(format!(
            "Identifier '{}' exceeds maximum length of {}",
            name, MAX_IDENTIFIER_LEN
        )));
    }

    Ok(())
}

/// Renders `n` comma-separated `?` placeholders.
pub fn placeholder_list(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// How a driver spells positional parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` (MySQL, SQLite)
    QuestionMark,
    /// `$1, $2, ...` (PostgreSQL)
    Numbered,
}

impl PlaceholderStyle {
    /// Rewrites the generic `?` placeholders of `sql` into this style.
    ///
    /// Question marks inside quoted literals or identifiers are left alone.
    pub fn rewrite<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        match self {
            PlaceholderStyle::QuestionMark => Cow::Borrowed(sql),
            PlaceholderStyle::Numbered => {
                let positions = placeholder_positions(sql);
                if positions.is_empty() {
                    return Cow::Borrowed(sql);
                }

                let mut out = String::with_capacity(sql.len() + positions.len() * 2);
                let mut last = 0;
                for (n, pos) in positions.iter().enumerate() {
                    out.push_str(&sql[last..*pos]);
                    out.push('$');
                    out.push_str(&(n + 1).to_string());
                    last = pos + 1;
                }
                out.push_str(&sql[last..]);
                Cow::Owned(out)
            }
        }
    }
}

/// Counts the generic `?` placeholders in `sql`, ignoring quoted text.
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_positions(sql).len()
}

fn placeholder_positions(sql: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in sql.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' && q != '`' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '?' => positions.push(idx),
                _ => {}
            },
        }
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_synthesize_statements() {
        let stmts = Statements::synthesize("users", "id", &fields(&["name", "email"]));

        assert_eq!(stmts.select, "select `id`, `name`, `email` from `users`");
        assert_eq!(
            stmts.insert,
            "insert into `users` (`name`, `email`, `id`) values (?, ?, ?)"
        );
        assert_eq!(stmts.update, "update `users` set `name`=?, `email`=? where `id`=?");
        assert_eq!(stmts.delete, "delete from `users` where `id`=?");
    }

    #[test]
    fn test_placeholder_counts_match_field_counts() {
        for n in 0..6 {
            let names: Vec<String> = (0..n).map(|i| format!("f{}", i)).collect();
            let stmts = Statements::synthesize("t", "pk", &names);
            assert_eq!(count_placeholders(&stmts.insert), n + 1);
            assert_eq!(count_placeholders(&stmts.update), n + 1);
            assert_eq!(count_placeholders(&stmts.delete), 1);
            assert_eq!(count_placeholders(&stmts.select), 0);
        }
    }

    #[test]
    fn test_key_only_update_is_well_formed() {
        let stmts = Statements::synthesize("tags", "tag", &[]);
        assert_eq!(stmts.select, "select `tag` from `tags`");
        assert_eq!(stmts.update, "update `tags` set `tag`=`tag` where `tag`=?");
        assert_eq!(stmts.insert, "insert into `tags` (`tag`) values (?)");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "`users`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("_private_1").is_ok());
        assert!(validate_identifier("blog-posts").is_ok());
        assert!(validate_identifier("1abc").is_ok());
        assert!(validate_identifier("$").is_ok());
        assert!(validate_identifier("na`me").is_ok());
        assert!(validate_identifier("café").is_ok());
        assert!(validate_identifier(&"a".repeat(64)).is_ok());
        assert!(validate_identifier(&"a".repeat(65)).is_err());
        assert!(matches!(validate_identifier(""), Err(OrmError::Schema(_))));
    }

    #[test]
    fn test_placeholder_list() {
        assert_eq!(placeholder_list(0), "");
        assert_eq!(placeholder_list(1), "?");
        assert_eq!(placeholder_list(3), "?, ?, ?");
    }

    #[test]
    fn test_count_ignores_quoted_question_marks() {
        assert_eq!(count_placeholders("select * from t where a=? and b='?'"), 1);
        assert_eq!(count_placeholders("select `a?` from t where c=\"?\" and d=?"), 1);
        assert_eq!(count_placeholders("select 'it\\'s ?' from t where x=?"), 1);
        assert_eq!(count_placeholders("select 'it''s ?' , ? from t"), 1);
    }

    #[test]
    fn test_rewrite_question_mark_is_identity() {
        let sql = "select * from t where a=?";
        let rewritten = PlaceholderStyle::QuestionMark.rewrite(sql);
        assert!(matches!(rewritten, Cow::Borrowed(_)));
        assert_eq!(rewritten, sql);
    }

    #[test]
    fn test_rewrite_numbered() {
        let sql = "update `t` set `a`=?, `b`=? where `id`=? and note='?'";
        assert_eq!(
            PlaceholderStyle::Numbered.rewrite(sql),
            "update `t` set `a`=$1, `b`=$2 where `id`=$3 and note='?'"
        );
        assert_eq!(PlaceholderStyle::Numbered.rewrite("select 1"), "select 1");
    }
}
