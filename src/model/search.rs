use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::knowledge::{KnowledgeItem, SourceType};
use super::page::{Page, Pagination};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, page: u32, size: u32) -> Self {
        Self {
            query: query.into(),
            filters: None,
            page: Some(page),
            size: Some(size),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<Vec<SourceType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl SearchFilters {
    /// Builds filters from selection sets; an empty set means "no filter".
    pub fn from_sets(source_types: &BTreeSet<SourceType>, tags: &BTreeSet<String>) -> Self {
        Self {
            source_type: (!source_types.is_empty())
                .then(|| source_types.iter().copied().collect()),
            tags: (!tags.is_empty()).then(|| tags.iter().cloned().collect()),
            author_id: None,
            date_range: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source_type.is_none()
            && self.tags.is_none()
            && self.author_id.is_none()
            && self.date_range.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub knowledge_item: KnowledgeItem,
    #[serde(default)]
    pub score: f64,
    /// Marked-up fragments (`<em>`, `<mark>`) around each match.
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl SearchResponse {
    /// Page count as reported, or derived from the count when the server omits it.
    pub fn page_count(&self) -> u32 {
        if self.total_pages > 0 || self.size == 0 {
            return self.total_pages;
        }
        self.total_count.div_ceil(u64::from(self.size)) as u32
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            size: self.size,
            total_pages: self.page_count(),
            total_elements: self.total_count,
        }
    }

    /// Reshapes a search response into the listing envelope so list views can
    /// treat both identically.
    pub fn into_page(self) -> Page<KnowledgeItem> {
        let total_pages = self.page_count();
        Page {
            total_elements: self.total_count,
            total_pages,
            size: self.size,
            number: self.page,
            first: self.page == 0,
            last: total_pages.checked_sub(1) == Some(self.page),
            content: self.results.into_iter().map(|r| r.knowledge_item).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::knowledge::sample_item;
    use serde_json::json;

    fn response(total_count: u64, page: u32, size: u32, total_pages: u32) -> SearchResponse {
        SearchResponse {
            results: vec![SearchResult {
                knowledge_item: sample_item("k1", "Kafka retention"),
                score: 0.82,
                highlights: vec!["<em>Kafka</em> retention".into()],
            }],
            total_count,
            page,
            size,
            total_pages,
        }
    }

    #[test]
    fn normalizes_into_listing_shape() {
        let page = response(37, 2, 10, 4).into_page();
        assert_eq!(page.number, 2);
        assert_eq!(page.total_elements, 37);
        assert_eq!(page.total_pages, 4);
        assert!(!page.first);
        assert!(!page.last, "page 2 is not the last index (3)");
        assert_eq!(page.content[0].id, "k1");
    }

    #[test]
    fn derives_missing_page_count() {
        let resp = response(37, 3, 10, 0);
        assert_eq!(resp.page_count(), 4);
        let page = resp.into_page();
        assert!(page.last);
    }

    #[test]
    fn empty_result_is_neither_last_nor_broken() {
        let page = response(0, 0, 10, 0).into_page();
        assert!(page.first);
        assert!(!page.last);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn filters_skip_empty_sets() {
        let types = BTreeSet::from([SourceType::Github]);
        let filters = SearchFilters::from_sets(&types, &BTreeSet::new());
        let mut req = SearchRequest::new("kafka", 0, 10);
        req.filters = Some(filters);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"query": "kafka", "filters": {"sourceType": ["GITHUB"]}, "page": 0, "size": 10})
        );
        assert!(SearchFilters::from_sets(&BTreeSet::new(), &BTreeSet::new()).is_empty());
    }

    #[test]
    fn parses_response_payload() {
        let json = json!({
            "results": [{
                "knowledgeItem": {"id": "a", "title": "A", "content": "body", "sourceType": "GITLAB"},
                "score": 0.5,
                "highlights": ["<mark>body</mark>"]
            }],
            "totalCount": 1,
            "page": 0,
            "size": 10,
            "totalPages": 1
        });
        let resp: SearchResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.results[0].knowledge_item.source_type, SourceType::Gitlab);
        assert_eq!(resp.pagination().total_elements, 1);
    }
}
