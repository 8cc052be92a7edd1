//! Listing DTOs for the amoCRM v4 API.
//!
//! # Design
//! Only the parts of a listing response that pagination needs are modelled:
//! the HAL `_links` block, the `_page` number, and a thin `EntityRef` per
//! embedded item. Full entity schemas stay with the caller. Unknown fields
//! are ignored so schema growth on the server never breaks a probe.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Paginated collections the client knows how to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Contacts,
    Leads,
    Companies,
    Tasks,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Contacts,
        EntityKind::Leads,
        EntityKind::Companies,
        EntityKind::Tasks,
    ];

    /// Path segment under `/api/v4`, also the key inside `_embedded`.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Contacts => "contacts",
            EntityKind::Leads => "leads",
            EntityKind::Companies => "companies",
            EntityKind::Tasks => "tasks",
        }
    }
}

/// A single HAL link.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: String,
}

/// The `_links` block of a listing response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<Link>,
}

impl Links {
    /// True when the page references itself, i.e. the page is non-empty.
    pub fn has_self(&self) -> bool {
        present(&self.self_link)
    }

    pub fn has_next(&self) -> bool {
        present(&self.next)
    }

    pub fn has_prev(&self) -> bool {
        present(&self.prev)
    }
}

fn present(link: &Option<Link>) -> bool {
    link.as_ref().is_some_and(|l| !l.href.is_empty())
}

/// A typed `filter[...]` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FieldValue {
    /// Wire rendering. Booleans go out as `1`/`0`, which is what the API
    /// expects for flags such as `is_completed`.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Bool(true) => "1".to_string(),
            FieldValue::Bool(false) => "0".to_string(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

/// Query parameters shared by every listing endpoint.
///
/// Fields left as `None` (or empty) are not emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Comma-separated relations, e.g. `contacts,catalog_elements`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with: Option<String>,
    /// Field to sort ascending by, e.g. `created_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<(String, FieldValue)>,
}

impl ListFilter {
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Add a `filter[key]=value` pair. `key` may itself contain brackets,
    /// e.g. `updated_at][from`.
    pub fn with_filter(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.filters.push((key.into(), value));
        self
    }

    /// Render as a percent-encoded query string without the leading `?`.
    pub fn to_query(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            ser.append_pair("query", query);
        }
        if let Some(limit) = self.limit.filter(|&l| l > 0) {
            ser.append_pair("limit", &limit.to_string());
        }
        if let Some(page) = self.page.filter(|&p| p > 0) {
            ser.append_pair("page", &page.to_string());
        }
        if let Some(with) = self.with.as_deref().filter(|w| !w.is_empty()) {
            ser.append_pair("with", with);
        }
        if let Some(order) = self.order.as_deref().filter(|o| !o.is_empty()) {
            ser.append_pair(&format!("order[{order}]"), "asc");
        }
        for (key, value) in &self.filters {
            ser.append_pair(&format!("filter[{key}]"), &value.render());
        }
        ser.finish()
    }
}

/// The minimum every listed entity carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListPage {
    pub page: Option<u32>,
    pub links: Links,
    pub items: Vec<EntityRef>,
}

impl ListPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Raw HAL envelope; `_embedded` is keyed by the entity kind.
#[derive(Debug, Deserialize)]
pub(crate) struct RawListPage {
    #[serde(rename = "_page", default)]
    pub page: Option<u32>,
    #[serde(rename = "_links", default)]
    pub links: Links,
    #[serde(rename = "_embedded", default)]
    pub embedded: BTreeMap<String, Vec<EntityRef>>,
}

impl RawListPage {
    pub(crate) fn into_page(mut self, kind: EntityKind) -> ListPage {
        ListPage {
            page: self.page,
            links: self.links,
            items: self.embedded.remove(kind.as_str()).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_renders_empty_query() {
        assert_eq!(ListFilter::default().to_query(), "");
    }

    #[test]
    fn filter_renders_in_stable_order() {
        let filter = ListFilter {
            query: Some("acme".to_string()),
            limit: Some(50),
            page: Some(3),
            with: Some("contacts".to_string()),
            order: Some("id".to_string()),
            filters: vec![("pipeline_id".to_string(), FieldValue::Int(7))],
        };
        assert_eq!(
            filter.to_query(),
            "query=acme&limit=50&page=3&with=contacts&order%5Bid%5D=asc&filter%5Bpipeline_id%5D=7"
        );
    }

    #[test]
    fn zero_limit_and_page_are_omitted() {
        let filter = ListFilter::default().with_limit(0).with_page(0);
        assert_eq!(filter.to_query(), "");
    }

    #[test]
    fn bool_filter_renders_as_digit() {
        let filter = ListFilter::default().with_filter("is_completed", FieldValue::Bool(false));
        assert_eq!(filter.to_query(), "filter%5Bis_completed%5D=0");
    }

    #[test]
    fn query_text_is_percent_encoded() {
        let filter = ListFilter {
            query: Some("a&b c".to_string()),
            ..ListFilter::default()
        };
        assert_eq!(filter.to_query(), "query=a%26b+c");
    }

    #[test]
    fn links_without_href_count_as_absent() {
        let links: Links = serde_json::from_str(r#"{"self":{"href":""},"next":{}}"#).unwrap();
        assert!(!links.has_self());
        assert!(!links.has_next());
        assert!(!links.has_prev());
    }

    #[test]
    fn middle_page_links_both_ways() {
        let links: Links = serde_json::from_str(
            r#"{"self":{"href":"a?page=2"},"next":{"href":"a?page=3"},"prev":{"href":"a?page=1"}}"#,
        )
        .unwrap();
        assert!(links.has_self());
        assert!(links.has_next());
        assert!(links.has_prev());
    }

    #[test]
    fn every_kind_serializes_as_its_path_segment() {
        for kind in EntityKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
            let back: EntityKind = serde_json::from_value(json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn raw_page_picks_embedded_by_kind() {
        let raw: RawListPage = serde_json::from_str(
            r#"{"_page":2,"_links":{"self":{"href":"x"}},
                "_embedded":{"leads":[{"id":5,"name":"Deal","price":100}]}}"#,
        )
        .unwrap();
        let page = raw.into_page(EntityKind::Leads);
        assert_eq!(page.page, Some(2));
        assert!(page.links.has_self());
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 5);
    }

    #[test]
    fn field_value_deserializes_untagged() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[true, 12, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Bool(true),
                FieldValue::Int(12),
                FieldValue::Text("x".to_string())
            ]
        );
    }
}
