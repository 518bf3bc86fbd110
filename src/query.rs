use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::{HistoricalRecord, ALL_CATEGORIES};

/// Accepted alongside [`ALL_CATEGORIES`], case-insensitively.
pub const ALL_CATEGORIES_ALIAS: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("category filter must not be blank")]
    EmptyCategory,
    #[error("limit must be greater than zero")]
    ZeroLimit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Exact, case-sensitive match.
    Only(String),
}

impl CategoryFilter {
    pub fn parse(raw: Option<&str>) -> Result<Self, QueryError> {
        match raw {
            None => Ok(Self::All),
            Some(value) if value.trim().is_empty() => Err(QueryError::EmptyCategory),
            Some(value) if value == ALL_CATEGORIES || value.eq_ignore_ascii_case(ALL_CATEGORIES_ALIAS) => {
                Ok(Self::All)
            }
            Some(value) => Ok(Self::Only(value.to_owned())),
        }
    }

    fn admits(&self, record: &HistoricalRecord) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => record.category == *category,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    pub category: CategoryFilter,
    /// Lowercased search term; `None` when absent or empty.
    search: Option<String>,
    pub limit: Option<usize>,
}

impl QueryRequest {
    pub fn new(category: Option<&str>, search: Option<&str>) -> Result<Self, QueryError> {
        Ok(Self {
            category: CategoryFilter::parse(category)?,
            search: search.filter(|s| !s.is_empty()).map(str::to_lowercase),
            limit: None,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Result<Self, QueryError> {
        if limit == 0 {
            return Err(QueryError::ZeroLimit);
        }
        self.limit = Some(limit);
        Ok(self)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn admits(&self, record: &HistoricalRecord) -> bool {
        self.category.admits(record) && self.search_admits(record)
    }

    fn search_admits(&self, record: &HistoricalRecord) -> bool {
        match &self.search {
            None => true,
            Some(term) => {
                record.topic.to_lowercase().contains(term.as_str())
                    || record.description.to_lowercase().contains(term.as_str())
            }
        }
    }
}

/// Most recently archived first; equal timestamps fall back to address order.
pub fn recency_order(a: &HistoricalRecord, b: &HistoricalRecord) -> Ordering {
    b.uploaded_at
        .cmp(&a.uploaded_at)
        .then_with(|| a.address.cmp(&b.address))
}

pub fn query(base: &[HistoricalRecord], request: &QueryRequest) -> Vec<HistoricalRecord> {
    let mut hits: Vec<HistoricalRecord> = base
        .iter()
        .filter(|record| request.admits(record))
        .cloned()
        .collect();
    hits.sort_by(recency_order);
    if let Some(limit) = request.limit {
        hits.truncate(limit);
    }
    hits
}

pub fn query_by(
    base: &[HistoricalRecord],
    category: Option<&str>,
    search: Option<&str>,
) -> Result<Vec<HistoricalRecord>, QueryError> {
    let request = QueryRequest::new(category, search)?;
    Ok(query(base, &request))
}

pub fn category_counts(base: &[HistoricalRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in base {
        *counts.entry(record.category.clone()).or_insert(0) += 1;
    }
    counts
}
