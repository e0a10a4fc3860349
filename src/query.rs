//! WQL restriction queries evaluated against credential tags

use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value as JsonValue};

/// An abstract query representation over a key and value type
#[derive(Debug, Hash, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum AbstractQuery<K, V> {
    /// Logical AND of multiple clauses
    And(Vec<Self>),
    /// Logical OR of multiple clauses
    Or(Vec<Self>),
    /// Negation of a clause
    Not(Box<Self>),
    /// Equality comparison for a field value
    Eq(K, V),
    /// Inequality comparison for a field value
    Neq(K, V),
    /// Greater-than comparison for a field value
    Gt(K, V),
    /// Greater-than-or-equal comparison for a field value
    Gte(K, V),
    /// Less-than comparison for a field value
    Lt(K, V),
    /// Less-than-or-equal comparison for a field value
    Lte(K, V),
    /// SQL 'LIKE'-compatible string comparison for a field value
    Like(K, V),
    /// Match one of multiple field values in a set
    In(K, Vec<V>),
    /// Match any non-null field value of the given field names
    Exist(Vec<K>),
}

/// A concrete query implementation with String keys and values
pub type Query = AbstractQuery<String, String>;

impl<K, V> Default for AbstractQuery<K, V> {
    fn default() -> Self {
        Self::And(Vec::new())
    }
}

impl<K: AsRef<str>, V: AsRef<str>> AbstractQuery<K, V> {
    /// Evaluate the query against a set of tag values
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        let tag = |k: &K| tags.get(k.as_ref()).map(String::as_str);
        match self {
            Self::And(subqueries) => subqueries.iter().all(|q| q.matches(tags)),
            Self::Or(subqueries) => subqueries.iter().any(|q| q.matches(tags)),
            Self::Not(query) => !query.matches(tags),
            Self::Eq(k, v) => tag(k) == Some(v.as_ref()),
            Self::Neq(k, v) => tag(k).map_or(false, |t| t != v.as_ref()),
            Self::Gt(k, v) => tag(k).map_or(false, |t| t > v.as_ref()),
            Self::Gte(k, v) => tag(k).map_or(false, |t| t >= v.as_ref()),
            Self::Lt(k, v) => tag(k).map_or(false, |t| t < v.as_ref()),
            Self::Lte(k, v) => tag(k).map_or(false, |t| t <= v.as_ref()),
            Self::Like(k, v) => tag(k).map_or(false, |t| like_match(t, v.as_ref())),
            Self::In(k, vs) => tag(k).map_or(false, |t| vs.iter().any(|v| v.as_ref() == t)),
            Self::Exist(ks) => ks.iter().all(|k| tag(k).is_some()),
        }
    }
}

impl<K, V> AbstractQuery<K, V> {
    /// Transform all field names in the query clauses
    pub fn map_names<RK, F>(self, f: &mut F) -> AbstractQuery<RK, V>
    where
        F: FnMut(K) -> RK,
    {
        match self {
            Self::And(subqueries) => {
                let mut mapped = Vec::with_capacity(subqueries.len());
                for query in subqueries {
                    mapped.push(query.map_names(&mut *f));
                }
                AbstractQuery::And(mapped)
            }
            Self::Or(subqueries) => {
                let mut mapped = Vec::with_capacity(subqueries.len());
                for query in subqueries {
                    mapped.push(query.map_names(&mut *f));
                }
                AbstractQuery::Or(mapped)
            }
            Self::Not(query) => AbstractQuery::Not(Box::new(query.map_names(f))),
            Self::Eq(k, v) => AbstractQuery::Eq(f(k), v),
            Self::Neq(k, v) => AbstractQuery::Neq(f(k), v),
            Self::Gt(k, v) => AbstractQuery::Gt(f(k), v),
            Self::Gte(k, v) => AbstractQuery::Gte(f(k), v),
            Self::Lt(k, v) => AbstractQuery::Lt(f(k), v),
            Self::Lte(k, v) => AbstractQuery::Lte(f(k), v),
            Self::Like(k, v) => AbstractQuery::Like(f(k), v),
            Self::In(k, vs) => AbstractQuery::In(f(k), vs),
            Self::Exist(ks) => AbstractQuery::Exist(ks.into_iter().map(&mut *f).collect()),
        }
    }
}

/// Match a value against a pattern where `%` matches any sequence and `_` any character
fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut v, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while v < value.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == value[v]) {
            v += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, v));
            p += 1;
        } else if let Some((bp, bv)) = backtrack {
            p = bp + 1;
            v = bv + 1;
            backtrack = Some((bp, bv + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

impl<K, V> Serialize for AbstractQuery<K, V>
where
    K: AsRef<str>,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = JsonValue::deserialize(deserializer)?;

        match v {
            JsonValue::Object(map) => parse_query(map).map_err(de::Error::custom),
            JsonValue::Array(array) => {
                // legacy restrictions: a list of alternative tag sets
                let mut res: Vec<JsonValue> = Vec::new();
                for sub_query in array {
                    let sub_query: serde_json::Map<String, JsonValue> = sub_query
                        .as_object()
                        .ok_or_else(|| de::Error::custom("Restriction is invalid"))?
                        .clone()
                        .into_iter()
                        .filter(|(_, v)| !v.is_null())
                        .collect();

                    if !sub_query.is_empty() {
                        res.push(JsonValue::Object(sub_query));
                    }
                }

                let mut map = serde_json::Map::new();
                map.insert("$or".to_string(), JsonValue::Array(res));

                parse_query(map).map_err(de::Error::custom)
            }
            _ => Err(de::Error::custom(
                "Restriction must be either object or array",
            )),
        }
    }
}

impl<K, V> AbstractQuery<K, V>
where
    K: AsRef<str>,
    V: Serialize,
{
    fn to_value(&self) -> JsonValue {
        match self {
            Self::Eq(tag_name, tag_value) => json!({ tag_name.as_ref(): tag_value }),
            Self::Neq(tag_name, tag_value) => json!({ tag_name.as_ref(): {"$neq": tag_value} }),
            Self::Gt(tag_name, tag_value) => json!({ tag_name.as_ref(): {"$gt": tag_value} }),
            Self::Gte(tag_name, tag_value) => json!({ tag_name.as_ref(): {"$gte": tag_value} }),
            Self::Lt(tag_name, tag_value) => json!({ tag_name.as_ref(): {"$lt": tag_value} }),
            Self::Lte(tag_name, tag_value) => json!({ tag_name.as_ref(): {"$lte": tag_value} }),
            Self::Like(tag_name, tag_value) => json!({ tag_name.as_ref(): {"$like": tag_value} }),
            Self::In(tag_name, tag_values) => json!({ tag_name.as_ref(): {"$in": tag_values} }),
            Self::Exist(tag_names) => {
                json!({ "$exist": tag_names.iter().map(|k| k.as_ref()).collect::<Vec<&str>>() })
            }
            Self::And(queries) => {
                if queries.is_empty() {
                    json!({})
                } else {
                    json!({ "$and": queries.iter().map(|q| q.to_value()).collect::<Vec<JsonValue>>() })
                }
            }
            Self::Or(queries) => {
                if queries.is_empty() {
                    json!({})
                } else {
                    json!({ "$or": queries.iter().map(|q| q.to_value()).collect::<Vec<JsonValue>>() })
                }
            }
            Self::Not(query) => json!({ "$not": query.to_value() }),
        }
    }
}

fn parse_query(map: serde_json::Map<String, JsonValue>) -> Result<Query, &'static str> {
    let mut operators: Vec<Query> = Vec::new();

    for (key, value) in map {
        if let Some(operator) = parse_operator(key, value)? {
            operators.push(operator);
        }
    }

    let query = if operators.len() == 1 {
        operators.remove(0)
    } else {
        Query::And(operators)
    };

    Ok(query)
}

fn parse_operator(key: String, value: JsonValue) -> Result<Option<Query>, &'static str> {
    match (key.as_str(), value) {
        ("$and", JsonValue::Array(values)) => {
            if values.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Query::And(parse_list_operators(values)?)))
            }
        }
        ("$and", _) => Err("$and must be array of JSON objects"),
        ("$or", JsonValue::Array(values)) => {
            if values.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Query::Or(parse_list_operators(values)?)))
            }
        }
        ("$or", _) => Err("$or must be array of JSON objects"),
        ("$not", JsonValue::Object(map)) => Ok(Some(Query::Not(Box::new(parse_query(map)?)))),
        ("$not", _) => Err("$not must be JSON object"),
        ("$exist", JsonValue::String(key)) => Ok(Some(Query::Exist(vec![key]))),
        ("$exist", JsonValue::Array(keys)) => {
            if keys.is_empty() {
                Ok(None)
            } else {
                let mut ks = Vec::with_capacity(keys.len());
                for key in keys {
                    if let JsonValue::String(key) = key {
                        ks.push(key);
                    } else {
                        return Err("$exist must be used with a string or array of strings");
                    }
                }
                Ok(Some(Query::Exist(ks)))
            }
        }
        ("$exist", _) => Err("$exist must be used with a string or array of strings"),
        (_, JsonValue::String(value)) => Ok(Some(Query::Eq(key, value))),
        (_, JsonValue::Object(map)) => {
            let mut entries = map.into_iter();
            match (entries.next(), entries.next()) {
                (Some((operator_name, value)), None) => {
                    parse_single_operator(operator_name, key, value).map(Some)
                }
                _ => Err("value must be JSON object of length 1"),
            }
        }
        (_, _) => Err("Unsupported value"),
    }
}

fn parse_list_operators(operators: Vec<JsonValue>) -> Result<Vec<Query>, &'static str> {
    let mut out_operators: Vec<Query> = Vec::with_capacity(operators.len());

    for value in operators {
        if let JsonValue::Object(map) = value {
            out_operators.push(parse_query(map)?);
        } else {
            return Err("operator must be array of JSON objects");
        }
    }

    Ok(out_operators)
}

fn parse_single_operator(
    operator_name: String,
    key: String,
    value: JsonValue,
) -> Result<Query, &'static str> {
    match (operator_name.as_str(), value) {
        ("$eq", JsonValue::String(value)) => Ok(Query::Eq(key, value)),
        ("$eq", _) => Err("$eq must be used with string"),
        ("$neq", JsonValue::String(value)) => Ok(Query::Neq(key, value)),
        ("$neq", _) => Err("$neq must be used with string"),
        ("$gt", JsonValue::String(value)) => Ok(Query::Gt(key, value)),
        ("$gt", _) => Err("$gt must be used with string"),
        ("$gte", JsonValue::String(value)) => Ok(Query::Gte(key, value)),
        ("$gte", _) => Err("$gte must be used with string"),
        ("$lt", JsonValue::String(value)) => Ok(Query::Lt(key, value)),
        ("$lt", _) => Err("$lt must be used with string"),
        ("$lte", JsonValue::String(value)) => Ok(Query::Lte(key, value)),
        ("$lte", _) => Err("$lte must be used with string"),
        ("$like", JsonValue::String(value)) => Ok(Query::Like(key, value)),
        ("$like", _) => Err("$like must be used with string"),
        ("$in", JsonValue::Array(values)) => {
            let mut target_values: Vec<String> = Vec::with_capacity(values.len());
            for v in values {
                if let JsonValue::String(s) = v {
                    target_values.push(s);
                } else {
                    return Err("$in must be used with array of strings");
                }
            }
            Ok(Query::In(key, target_values))
        }
        ("$in", _) => Err("$in must be used with array of strings"),
        (_, _) => Err("Unknown operator"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> BTreeMap<String, String> {
        [
            ("schema_name", "gvt"),
            ("issuer_id", "mock:uri"),
            ("attr::name::value", "Alex"),
            ("attr::name::marker", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn parse_and_match() {
        let query: Query = serde_json::from_str(
            r#"{"$and": [{"schema_name": "gvt"}, {"issuer_id": {"$in": ["a", "mock:uri"]}}]}"#,
        )
        .unwrap();
        assert!(query.matches(&tags()));

        let query: Query = serde_json::from_str(r#"{"$not": {"schema_name": "gvt"}}"#).unwrap();
        assert!(!query.matches(&tags()));

        let query: Query =
            serde_json::from_str(r#"{"attr::name::value": {"$neq": "Bob"}}"#).unwrap();
        assert!(query.matches(&tags()));

        let query: Query = serde_json::from_str(r#"{"$exist": ["attr::age::marker"]}"#).unwrap();
        assert!(!query.matches(&tags()));

        assert!(Query::default().matches(&tags()));
        assert!(serde_json::from_str::<Query>(r#"{"schema_name": {"$foo": "x"}}"#).is_err());
    }

    #[test]
    fn legacy_array_restrictions() {
        let query: Query =
            serde_json::from_str(r#"[{"schema_name": "other"}, {"issuer_id": "mock:uri"}]"#)
                .unwrap();
        assert_eq!(
            query,
            Query::Or(vec![
                Query::Eq("schema_name".to_string(), "other".to_string()),
                Query::Eq("issuer_id".to_string(), "mock:uri".to_string()),
            ])
        );
        assert!(query.matches(&tags()));
        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(
            json,
            r#"{"$or":[{"schema_name":"other"},{"issuer_id":"mock:uri"}]}"#
        );
        let again: Query = serde_json::from_str(&json).unwrap();
        assert_eq!(serde_json::to_string(&again).unwrap(), json);
    }

    #[test]
    fn like_patterns() {
        assert!(like_match("mock:uri", "mock:%"));
        assert!(like_match("mock:uri", "%:u_i"));
        assert!(like_match("", "%"));
        assert!(!like_match("mock:uri", "mock"));
        assert!(!like_match("mock", "mock_"));
    }

    #[test]
    fn rename_fields() {
        let query: Query =
            serde_json::from_str(r#"{"$or": [{"attr::Name::value": "Alex"}, {"$exist": ["X"]}]}"#)
                .unwrap();
        let query = query.map_names(&mut |k: String| k.to_lowercase());
        assert!(query.matches(&tags()));
    }
}
