use std::collections::BTreeMap;

use serde_json::Value;

use super::error::FilterError;

/// Sort order for list queries, rendered as `field` or `-field`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn parse(spec: &str) -> Result<Self, FilterError> {
        let (field, descending) = match spec.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (spec, false),
        };
        ListFilter::validate_field(field).map_err(|_| FilterError::InvalidSort(spec.to_string()))?;
        Ok(Self { field: field.to_string(), descending })
    }

    fn render(&self) -> String {
        if self.descending {
            format!("-{}", self.field)
        } else {
            self.field.clone()
        }
    }
}

/// Filter and pagination parameters for a list read.
///
/// The rendered query string is canonical (keys sorted), so two filters that
/// select the same rows always produce the same cache key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    page: Option<u32>,
    per_page: Option<u32>,
    search: Option<String>,
    status: Option<String>,
    sort: Option<SortSpec>,
    filters: BTreeMap<String, String>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON document such as `{"status":"draft","page":2,"supplier_id":"s-1"}`.
    /// Unknown keys become equality filters.
    pub fn from_json(doc: &Value) -> Result<Self, FilterError> {
        let object = doc
            .as_object()
            .ok_or_else(|| FilterError::InvalidDocument("Filter must be a JSON object".to_string()))?;

        let mut filter = Self::new();
        for (key, value) in object {
            match key.as_str() {
                "page" => {
                    filter.page(as_u32(key, value)?)?;
                }
                "per_page" | "limit" => {
                    filter.per_page(as_u32(key, value)?)?;
                }
                "search" | "q" => {
                    filter.search(as_text(value));
                }
                "status" => {
                    filter.status(as_text(value));
                }
                "sort" | "order" => {
                    filter.sort(&as_text(value))?;
                }
                _ => {
                    filter.where_eq(key, as_text(value))?;
                }
            }
        }
        Ok(filter)
    }

    pub fn page(&mut self, page: u32) -> Result<&mut Self, FilterError> {
        if page == 0 { return Err(FilterError::InvalidPage("Pages are numbered from 1".to_string())); }
        self.page = Some(page);
        Ok(self)
    }

    pub fn per_page(&mut self, per_page: u32) -> Result<&mut Self, FilterError> {
        if per_page == 0 { return Err(FilterError::InvalidPageSize("Page size must be positive".to_string())); }
        self.per_page = Some(per_page);
        Ok(self)
    }

    pub fn search(&mut self, term: impl Into<String>) -> &mut Self {
        let term = term.into();
        self.search = if term.trim().is_empty() { None } else { Some(term) };
        self
    }

    pub fn status(&mut self, status: impl Into<String>) -> &mut Self {
        self.status = Some(status.into());
        self
    }

    pub fn sort(&mut self, spec: &str) -> Result<&mut Self, FilterError> {
        self.sort = Some(SortSpec::parse(spec)?);
        Ok(self)
    }

    pub fn where_eq(&mut self, field: &str, value: impl Into<String>) -> Result<&mut Self, FilterError> {
        Self::validate_field(field)?;
        self.filters.insert(field.to_string(), value.into());
        Ok(self)
    }

    /// Clamp the page size to the server-side maximum
    pub fn cap_page_size(&mut self, max: u32) -> &mut Self {
        if let Some(per_page) = self.per_page {
            if per_page > max {
                tracing::warn!("Page size {} exceeds max {}, capping to max", per_page, max);
                self.per_page = Some(max);
            }
        }
        self
    }

    pub fn status_value(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Query pairs in canonical order
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: BTreeMap<String, String> = self.filters.clone();
        if let Some(page) = self.page { pairs.insert("page".into(), page.to_string()); }
        if let Some(per_page) = self.per_page { pairs.insert("per_page".into(), per_page.to_string()); }
        if let Some(ref search) = self.search { pairs.insert("search".into(), search.clone()); }
        if let Some(ref status) = self.status { pairs.insert("status".into(), status.clone()); }
        if let Some(ref sort) = self.sort { pairs.insert("sort".into(), sort.render()); }
        pairs.into_iter().collect()
    }

    /// Stable textual key for the query cache
    pub fn cache_key(&self) -> String {
        self.to_query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn validate_field(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_');
        if !valid_start || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
            return Err(FilterError::InvalidField(format!("Invalid field name format: {}", name)));
        }
        Ok(())
    }
}

fn as_u32(key: &str, value: &Value) -> Result<u32, FilterError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| FilterError::InvalidDocument(format!("'{}' must be a positive integer", key)))
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cache_key_is_order_independent() {
        let mut a = ListFilter::new();
        a.status("draft").where_eq("supplier_id", "s-1").unwrap().page(2).unwrap();

        let mut b = ListFilter::new();
        b.page(2).unwrap().where_eq("supplier_id", "s-1").unwrap().status("draft");

        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "page=2&status=draft&supplier_id=s-1");
    }

    #[test]
    fn from_json_maps_known_and_unknown_keys() {
        let filter = ListFilter::from_json(&json!({
            "page": 3,
            "limit": "25",
            "q": "bolts",
            "sort": "-created_at",
            "warehouse_id": "wh-9"
        }))
        .unwrap();

        let pairs = filter.to_query_pairs();
        assert!(pairs.contains(&("per_page".into(), "25".into())));
        assert!(pairs.contains(&("search".into(), "bolts".into())));
        assert!(pairs.contains(&("sort".into(), "-created_at".into())));
        assert!(pairs.contains(&("warehouse_id".into(), "wh-9".into())));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(ListFilter::new().page(0).is_err());
        assert!(ListFilter::new().per_page(0).is_err());
        assert!(ListFilter::new().where_eq("drop table", "x").is_err());
        assert_eq!(
            SortSpec::parse("-9lives"),
            Err(FilterError::InvalidSort("-9lives".to_string()))
        );
        assert!(ListFilter::from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn page_size_is_capped() {
        let mut filter = ListFilter::new();
        filter.per_page(1000).unwrap().cap_page_size(100);
        assert_eq!(filter.cache_key(), "per_page=100");
    }

    #[test]
    fn blank_search_is_dropped() {
        let mut filter = ListFilter::new();
        filter.search("   ");
        assert!(filter.to_query_pairs().is_empty());
    }
}
