//! Decoded Query Parameters
//!
//! Key → values mapping of a request query, keeping the order in which keys
//! first appear. Percent-decoding is left to the `url` crate.

use std::collections::{BTreeMap, HashMap};

use qk_core::{QueryError, QueryResult};

/// Decoded query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw query string such as `name=John&age:GTE=18`
    pub fn from_query_str(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Decode the query part of a full URL
    pub fn from_url(raw: &str) -> QueryResult<Self> {
        let parsed = url::Url::parse(raw).map_err(|e| QueryError::InvalidUrl {
            message: e.to_string(),
        })?;
        Ok(parsed.query_pairs().into_owned().collect())
    }

    /// Append one value under a key
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Set all values of a key, replacing existing ones
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((key, values)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

impl From<BTreeMap<String, Vec<String>>> for QueryParams {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }
}

/// Keys are sorted, since a `HashMap` has no stable order
impl From<HashMap<String, Vec<String>>> for QueryParams {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        Self::from(map.into_iter().collect::<BTreeMap<_, _>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_str_keeps_order() {
        let params = QueryParams::from_query_str("?sort=-age&name=John&age:GTE=18&name=Jane");
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["sort", "name", "age:GTE"]);
        assert_eq!(params.get("name").unwrap(), &["John", "Jane"]);
    }

    #[test]
    fn test_or_group_survives_decoding() {
        let params = QueryParams::from_query_str("status=active|status=banned");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("status").unwrap(), &["active|status=banned"]);
    }

    #[test]
    fn test_percent_decoding() {
        let params = QueryParams::from_query_str("name:LIKE=%2Ajo%20hn%2A&id:IN=1%2C2");
        assert_eq!(params.get("name:LIKE").unwrap(), &["*jo hn*"]);
        assert_eq!(params.get("id:IN").unwrap(), &["1,2"]);
    }

    #[test]
    fn test_from_url() {
        let params = QueryParams::from_url("https://api.example.com/users?limit=10&offset=20").unwrap();
        assert_eq!(params.get("limit").unwrap(), &["10"]);
        assert_eq!(params.get("offset").unwrap(), &["20"]);

        assert!(matches!(
            QueryParams::from_url("not a url"),
            Err(QueryError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_from_hash_map_is_sorted() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), vec!["2".to_string()]);
        map.insert("a".to_string(), vec!["1".to_string()]);
        map.insert("c".to_string(), vec!["3".to_string()]);

        let params = QueryParams::from(map);
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_replaces() {
        let mut params = QueryParams::new();
        params.append("limit", "10");
        params.insert("limit", vec!["5".to_string()]);
        assert_eq!(params.get("limit").unwrap(), &["5"]);
        assert!(params.contains_key("limit"));
        assert!(!params.contains_key("offset"));
    }
}
