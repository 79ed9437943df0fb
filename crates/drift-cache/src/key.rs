use drift_query::{CountMode, ParsedQuery};

/// Literal prefix identifying keys minted by this codec.
pub const KEY_PREFIX: &str = "drift";
/// Reserved separator. Constituent fields are escaped upstream and never
/// contain it.
pub const KEY_SEPARATOR: char = '|';
/// Prefix marking the key of an infinite (paginated) list.
pub const INFINITE_PREFIX: &str = "inf|";
/// Schema used when a query does not name one.
pub const DEFAULT_SCHEMA: &str = "public";

/// The structured form of a cache key. Borrows from the decoded string.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedKey<'a> {
    pub is_infinite: bool,
    pub schema: &'a str,
    pub table: &'a str,
    pub query: &'a str,
    pub body: &'a str,
    pub count: Option<CountMode>,
    pub is_head: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Encode a parsed query into its canonical cache key.
///
/// Layout: `[inf|]drift|schema|table|query[|body]|count=<mode>|head=<bool>`.
/// Empty components are dropped before joining; in practice only `body` can
/// be empty (the query string always carries at least `select=`). Pure:
/// identical queries encode to identical keys, and any difference in
/// schema, table, query, body, count or head produces a different key.
pub fn encode(query: &ParsedQuery, is_infinite: bool) -> String {
    let sep = KEY_SEPARATOR;
    let schema = query.schema.as_deref().unwrap_or(DEFAULT_SCHEMA);
    let count = match query.count {
        Some(mode) => mode.as_str(),
        None => "null",
    };
    let count_token = format!("count={count}");
    let head_token = format!("head={}", query.head);

    let mut parts: Vec<&str> = vec![
        KEY_PREFIX,
        schema,
        query.table.as_str(),
        query.query.as_str(),
        query.body.as_str(),
    ];
    parts.retain(|part| !part.is_empty());
    parts.push(&count_token);
    parts.push(&head_token);

    let mut key = String::new();
    if is_infinite {
        key.push_str(INFINITE_PREFIX);
    }
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(sep);
        }
        key.push_str(part);
    }
    key
}

/// Decode a cache key back into its structured parts.
///
/// Total for every string `encode` produces, and `None` for anything else:
/// inputs not starting with the reserved prefix (after stripping an
/// optional infinite prefix), keys whose trailing components are not
/// well-formed `count=`/`head=` tokens, and keys with the wrong component
/// count all decode to `None` rather than panicking. Because `encode`
/// drops an empty body, the leading components may number three (schema,
/// table, query) or four (plus body); a missing body decodes as `""`.
pub fn decode(key: &str) -> Option<DecodedKey<'_>> {
    let (is_infinite, stripped) = match key.strip_prefix(INFINITE_PREFIX) {
        Some(rest) => (true, rest),
        None => (false, key),
    };

    // Exit early if this is not one of our keys.
    let rest = stripped
        .strip_prefix(KEY_PREFIX)?
        .strip_prefix(KEY_SEPARATOR)?;
    let parts: Vec<&str> = rest.split(KEY_SEPARATOR).collect();
    if parts.len() < 5 {
        return None;
    }

    let head_raw = parts[parts.len() - 1].strip_prefix("head=")?;
    let count_raw = parts[parts.len() - 2].strip_prefix("count=")?;
    let count = match count_raw {
        "null" => None,
        token => Some(CountMode::from_token(token)?),
    };

    let (schema, table, query, body) = match parts[..parts.len() - 2] {
        [schema, table, query] => (schema, table, query, ""),
        [schema, table, query, body] => (schema, table, query, body),
        _ => return None,
    };

    let mut limit = None;
    let mut offset = None;
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("limit=") {
            limit = value.parse().ok();
        } else if let Some(value) = pair.strip_prefix("offset=") {
            offset = value.parse().ok();
        }
    }

    Some(DecodedKey {
        is_infinite,
        schema,
        table,
        query,
        body,
        count,
        is_head: head_raw == "true",
        limit,
        offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_query::{SortDirection, TableQuery};
    use serde_json::json;

    fn sample_query() -> ParsedQuery {
        TableQuery::table("contact")
            .select("id,username")
            .ilike("username", "test%")
            .order("username", SortDirection::Asc)
            .limit(1)
            .count(CountMode::Exact)
            .parse()
    }

    #[test]
    fn encode_layout() {
        let key = encode(&sample_query(), false);
        assert_eq!(
            key,
            "drift|public|contact|select=id,username&username=ilike.test%&order=username.asc&limit=1|count=exact|head=false"
        );
    }

    #[test]
    fn infinite_prefix_is_prepended() {
        let parsed = sample_query();
        let plain = encode(&parsed, false);
        let infinite = encode(&parsed, true);
        assert_eq!(infinite, format!("{INFINITE_PREFIX}{plain}"));
    }

    #[test]
    fn encode_is_pure() {
        let parsed = sample_query();
        assert_eq!(encode(&parsed, true), encode(&parsed, true));
    }

    #[test]
    fn semantically_equal_queries_collide() {
        let a = TableQuery::table("contact").eq("a", 1).gt("b", 2).parse();
        let b = TableQuery::table("contact").gt("b", 2).eq("a", 1).parse();
        assert_eq!(encode(&a, false), encode(&b, false));
    }

    #[test]
    fn different_queries_never_collide() {
        let base = sample_query();

        let mut other = base.clone();
        other.table = "address".into();
        assert_ne!(encode(&base, false), encode(&other, false));

        let mut other = base.clone();
        other.schema = Some("storage".into());
        assert_ne!(encode(&base, false), encode(&other, false));

        let mut other = base.clone();
        other.head = true;
        assert_ne!(encode(&base, false), encode(&other, false));

        let mut other = base.clone();
        other.count = None;
        assert_ne!(encode(&base, false), encode(&other, false));
    }

    #[test]
    fn decode_roundtrip() {
        let parsed = sample_query();
        let key = encode(&parsed, true);
        let decoded = decode(&key).unwrap();

        assert!(decoded.is_infinite);
        assert_eq!(decoded.schema, "public");
        assert_eq!(decoded.table, "contact");
        assert_eq!(decoded.query, parsed.query);
        assert_eq!(decoded.body, "");
        assert_eq!(decoded.count, Some(CountMode::Exact));
        assert!(!decoded.is_head);
        assert_eq!(decoded.limit, Some(1));
        assert_eq!(decoded.offset, None);
    }

    #[test]
    fn decode_roundtrip_with_body() {
        let parsed = TableQuery::table("contact")
            .body(json!({ "username": "u1" }))
            .offset(4)
            .limit(2)
            .parse();
        let decoded_key = encode(&parsed, false);
        let decoded = decode(&decoded_key).unwrap();

        assert_eq!(decoded.body, r#"{"username":"u1"}"#);
        assert_eq!(decoded.limit, Some(2));
        assert_eq!(decoded.offset, Some(4));
        assert_eq!(decoded.count, None);
    }

    #[test]
    fn decode_foreign_keys_is_none() {
        assert!(decode("random-string").is_none());
        assert!(decode("").is_none());
        assert!(decode("swr|public|contact|select=*|count=null|head=false").is_none());
    }

    #[test]
    fn decode_malformed_suffix_is_none() {
        // Prefix matches but the tagged components are missing or mangled.
        assert!(decode("drift|public|contact").is_none());
        assert!(decode("drift|public|contact|select=*|head=false|count=exact").is_none());
        assert!(decode("drift|public|contact|select=*|count=bogus|head=false").is_none());
    }

    #[test]
    fn decode_head_flag_is_exact_literal() {
        let key = "drift|public|contact|select=*|count=null|head=TRUE";
        assert!(!decode(key).unwrap().is_head);
        let key = "drift|public|contact|select=*|count=null|head=true";
        assert!(decode(key).unwrap().is_head);
    }
}
