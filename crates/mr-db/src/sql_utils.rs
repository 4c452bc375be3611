//! SQL quoting helpers for statements built at runtime

/// Quote a SQL identifier, doubling embedded double quotes.
///
/// # Examples
/// ```
/// use mr_db::sql_utils::quote_ident;
/// assert_eq!(quote_ident("migrun_checkpoint"), r#""migrun_checkpoint""#);
/// assert_eq!(quote_ident(r#"odd"name"#), r#""odd""name""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `ops.checkpoints`).
///
/// # Examples
/// ```
/// use mr_db::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("ops.checkpoints"), r#""ops"."checkpoints""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote a string literal, doubling embedded single quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
