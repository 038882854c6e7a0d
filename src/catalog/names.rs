use super::ObjectKind;

/// Keywords PostgreSQL does not accept as a bare schema or object name
/// (its reserved and type/function-name categories), sorted for binary search.
const RESERVED_KEYWORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
    "column", "concurrently", "constraint", "create", "cross", "current_catalog",
    "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant", "group",
    "having", "ilike", "in", "initially", "inner", "intersect", "into", "is", "isnull",
    "join", "lateral", "leading", "left", "like", "limit", "localtime", "localtimestamp",
    "natural", "not", "notnull", "null", "offset", "on", "only", "or", "order", "outer",
    "overlaps", "placing", "primary", "references", "returning", "right", "select",
    "session_user", "similar", "some", "symmetric", "system_user", "table", "tablesample",
    "then", "to", "trailing", "true", "union", "unique", "user", "using", "variadic",
    "verbose", "when", "where", "window", "with",
];

/// Return the identifier without surrounding double quotes.
///
/// Doubled quotes inside a quoted identifier collapse back to one. Anything
/// after the closing quote (a function argument list) is kept as written.
pub fn unquote_identifier(ident: &str) -> String {
    let Some(quoted) = ident.strip_prefix('"') else {
        return ident.to_string();
    };

    let mut name = String::with_capacity(quoted.len());
    let mut chars = quoted.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch != '"' {
            name.push(ch);
            continue;
        }
        if chars.peek().is_some_and(|(_, next)| *next == '"') {
            chars.next();
            name.push('"');
            continue;
        }
        name.push_str(&quoted[idx + 1..]);
        return name;
    }

    // Unterminated quote: treat the text as a plain identifier.
    ident.to_string()
}

/// Split a spec item into `(schema, object)` at the first unquoted dot.
///
/// Both parts are returned unquoted. Items without a dot name a schema.
///
/// ```
/// use privsync::catalog::names::split_qualified_name;
///
/// assert_eq!(
///     split_qualified_name(r#""my.schema"."my.table""#),
///     ("my.schema".to_string(), Some("my.table".to_string()))
/// );
/// assert_eq!(split_qualified_name("reports"), ("reports".to_string(), None));
/// ```
pub fn split_qualified_name(name: &str) -> (String, Option<String>) {
    let mut in_quotes = false;

    for (idx, ch) in name.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                let schema = unquote_identifier(name[..idx].trim());
                let object = unquote_identifier(name[idx + 1..].trim());
                return (schema, Some(object));
            }
            _ => {}
        }
    }

    (unquote_identifier(name.trim()), None)
}

/// Double-quote an identifier, escaping embedded quotes.
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// True when `ident` is a PostgreSQL keyword that must be quoted to be used as a name.
pub fn is_reserved_keyword(ident: &str) -> bool {
    RESERVED_KEYWORDS.binary_search(&ident).is_ok()
}

/// Render a schema name, quoting it only when PostgreSQL would otherwise fold
/// or reject it: anything outside `[a-z_][a-z0-9_$]*`, and reserved keywords.
pub fn render_schema(schema: &str) -> String {
    let mut chars = schema.chars();
    let plain = chars
        .next()
        .is_some_and(|ch| ch.is_ascii_lowercase() || ch == '_')
        && chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '$');

    if plain && !is_reserved_keyword(schema) {
        schema.to_string()
    } else {
        quote_identifier(schema)
    }
}

/// Render an object name. Function signatures keep their argument list
/// unquoted, so `total(integer)` becomes `"total"(integer)`; every other kind
/// quotes the whole name.
pub fn render_object(kind: ObjectKind, object: &str) -> String {
    match object.find('(') {
        Some(open) if kind == ObjectKind::Functions && object.ends_with(')') => {
            format!("{}{}", quote_identifier(&object[..open]), &object[open..])
        }
        _ => quote_identifier(object),
    }
}

/// Canonical rendering of an object reference, shared by desired and current
/// privilege sets so they compare equal.
///
/// Schemas render as the bare schema name; other objects as `schema."object"`.
pub fn qualified_name(kind: ObjectKind, schema: &str, object: Option<&str>) -> String {
    match object {
        Some(object) => format!("{}.{}", render_schema(schema), render_object(kind, object)),
        None => render_schema(schema),
    }
}

/// Normalize a spec item (quoted or not) into its canonical qualified name.
pub fn ensure_quoted_identifier(kind: ObjectKind, item: &str) -> String {
    let (schema, object) = split_qualified_name(item);
    qualified_name(kind, &schema, object.as_deref())
}
