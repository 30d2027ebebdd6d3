//! SQL text builders for repository statements.
//!
//! Identifiers are interpolated (backtick-quoted); values never are. Every
//! builder emits one `?` per bound value, in binding order.

pub(crate) fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn column_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn row_marks(width: usize) -> String {
    format!("({})", vec!["?"; width].join(", "))
}

/// `INSERT INTO `t` (`a`, `b`) VALUES (?, ?)`, or `DEFAULT VALUES` when
/// there is nothing to bind.
pub(crate) fn insert(table: &str, names: &[&str]) -> String {
    if names.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table));
    }
    insert_rows(table, names, 1)
}

/// Multi-row insert with `rows` value groups of `names.len()` marks each.
pub(crate) fn insert_rows(table: &str, names: &[&str], rows: usize) -> String {
    let marks = row_marks(names.len());
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        column_list(names),
        vec![marks.as_str(); rows].join(", ")
    )
}

/// Multi-row insert that updates every non-key column when `key` conflicts.
///
/// SQLite flavor of `ON DUPLICATE KEY UPDATE f = VALUES(f)`.
pub(crate) fn upsert_rows(table: &str, key: &str, names: &[&str], rows: usize) -> String {
    let assignments = names
        .iter()
        .filter(|name| **name != key)
        .map(|name| {
            let column = quote_ident(name);
            format!("{column} = excluded.{column}")
        })
        .collect::<Vec<_>>();

    let action = if assignments.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", assignments.join(", "))
    };

    format!(
        "{} ON CONFLICT({}) {}",
        insert_rows(table, names, rows),
        quote_ident(key),
        action
    )
}

/// `UPDATE `t` SET `a` = ?, `b` = ? WHERE `key` = ?`
pub(crate) fn update(table: &str, names: &[&str], key: &str) -> String {
    format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quote_ident(table),
        equality_list(names, ", "),
        quote_ident(key)
    )
}

pub(crate) fn delete(table: &str, key: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_ident(table),
        quote_ident(key)
    )
}

/// `SELECT <fields or *> FROM `t` [WHERE `a` = ? AND `b` = ?]`
pub(crate) fn select(table: &str, fields: &[&str], filters: &[&str]) -> String {
    let projection = if fields.is_empty() {
        "*".to_string()
    } else {
        column_list(fields)
    };
    let mut sql = format!("SELECT {projection} FROM {}", quote_ident(table));
    if !filters.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&equality_list(filters, " AND "));
    }
    sql
}

fn equality_list(names: &[&str], separator: &str) -> String {
    names
        .iter()
        .map(|name| format!("{} = ?", quote_ident(name)))
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::{delete, insert, insert_rows, quote_ident, select, update, upsert_rows};

    #[test]
    fn quote_ident_doubles_embedded_backticks() {
        assert_eq!(quote_ident("users"), "`users`");
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn insert_lists_columns_in_given_order() {
        assert_eq!(
            insert("users", &["name", "email"]),
            "INSERT INTO `users` (`name`, `email`) VALUES (?, ?)"
        );
        assert_eq!(insert("users", &[]), "INSERT INTO `users` DEFAULT VALUES");
    }

    #[test]
    fn insert_rows_repeats_value_groups() {
        assert_eq!(
            insert_rows("users", &["name", "email"], 3),
            "INSERT INTO `users` (`name`, `email`) VALUES (?, ?), (?, ?), (?, ?)"
        );
    }

    #[test]
    fn upsert_updates_only_non_key_columns() {
        assert_eq!(
            upsert_rows("users", "id", &["id", "name", "email"], 2),
            "INSERT INTO `users` (`id`, `name`, `email`) VALUES (?, ?, ?), (?, ?, ?) \
             ON CONFLICT(`id`) DO UPDATE SET `name` = excluded.`name`, `email` = excluded.`email`"
        );
    }

    #[test]
    fn upsert_with_key_only_does_nothing_on_conflict() {
        assert_eq!(
            upsert_rows("flags", "id", &["id"], 1),
            "INSERT INTO `flags` (`id`) VALUES (?) ON CONFLICT(`id`) DO NOTHING"
        );
    }

    #[test]
    fn update_binds_key_last() {
        assert_eq!(
            update("users", &["name", "email"], "id"),
            "UPDATE `users` SET `name` = ?, `email` = ? WHERE `id` = ?"
        );
    }

    #[test]
    fn delete_matches_on_key() {
        assert_eq!(delete("users", "id"), "DELETE FROM `users` WHERE `id` = ?");
    }

    #[test]
    fn select_projection_and_filters() {
        assert_eq!(select("users", &[], &[]), "SELECT * FROM `users`");
        assert_eq!(
            select("users", &["id", "name"], &["name", "email"]),
            "SELECT `id`, `name` FROM `users` WHERE `name` = ? AND `email` = ?"
        );
    }
}
