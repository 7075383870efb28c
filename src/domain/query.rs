//! Typed list query: the filter, the page window and the aggregation payload
//! returned by `GET /api/tasks`.

use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::error::QueryError;
use super::task::{Priority, Status, Task};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// Conjunction of optional constraints. An empty set or a missing search
/// matches every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    search: Option<String>,
    priorities: BTreeSet<Priority>,
    statuses: BTreeSet<Status>,
}

impl TaskFilter {
    pub fn builder() -> TaskFilterBuilder { TaskFilterBuilder::default() }

    pub fn search(&self) -> Option<&str> { self.search.as_deref() }
    pub fn priorities(&self) -> &BTreeSet<Priority> { &self.priorities }
    pub fn statuses(&self) -> &BTreeSet<Status> { &self.statuses }

    /// Same filter with the status constraint dropped. Status counts are taken
    /// against this so every status option shows what selecting it would add.
    pub fn without_status(&self) -> Self {
        Self { statuses: BTreeSet::new(), ..self.clone() }
    }

    /// In-process evaluation for test doubles, kept in line with the SQL
    /// predicate over the lowercased description.
    #[cfg(test)]
    pub(crate) fn matches(&self, task: &Task) -> bool {
        if let Some(search) = &self.search {
            let haystack = task.description.to_lowercase();
            if !haystack.contains(&search.to_lowercase()) { return false; }
        }
        (self.priorities.is_empty() || self.priorities.contains(&task.priority))
            && (self.statuses.is_empty() || self.statuses.contains(&task.status))
    }
}

#[derive(Debug, Default)]
pub struct TaskFilterBuilder {
    search: Option<String>,
    priorities: BTreeSet<Priority>,
    statuses: BTreeSet<Status>,
}

impl TaskFilterBuilder {
    /// Blank search text imposes no constraint.
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = if text.is_empty() { None } else { Some(text) };
        self
    }

    pub fn priorities(mut self, priorities: impl IntoIterator<Item = Priority>) -> Self {
        self.priorities.extend(priorities);
        self
    }

    pub fn statuses(mut self, statuses: impl IntoIterator<Item = Status>) -> Self {
        self.statuses.extend(statuses);
        self
    }

    pub fn build(self) -> TaskFilter {
        TaskFilter { search: self.search, priorities: self.priorities, statuses: self.statuses }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self { Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT } }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Result<Self, QueryError> {
        let page = NonZeroU32::new(page).ok_or_else(|| QueryError::Page(page.to_string()))?;
        let limit = NonZeroU32::new(limit).ok_or_else(|| QueryError::Limit(limit.to_string()))?;
        Ok(Self::at(page, limit))
    }

    pub fn at(page: NonZeroU32, limit: NonZeroU32) -> Self {
        Self { page: page.get(), limit: limit.get() }
    }

    pub fn page(&self) -> u32 { self.page }
    pub fn limit(&self) -> u32 { self.limit }
    pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }

    pub fn total_pages(&self, total_count: u64) -> u64 { total_count.div_ceil(u64::from(self.limit)) }
}

/// Raw query-string parameters, as sent by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: PageRequest,
    pub filter: TaskFilter,
}

impl ListQuery {
    pub fn parse(params: &ListParams) -> Result<Self, QueryError> {
        let page = match params.page.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_PAGE,
            Some(raw) => raw.parse().map_err(|_| QueryError::Page(raw.to_string()))?,
        };
        let limit = match params.limit.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_LIMIT,
            Some(raw) => raw.parse().map_err(|_| QueryError::Limit(raw.to_string()))?,
        };
        let priorities = split_list(params.priority.as_deref())
            .map(str::parse)
            .collect::<Result<Vec<Priority>, _>>()?;
        let statuses = split_list(params.status.as_deref())
            .filter(|s| *s != "all")
            .map(str::parse)
            .collect::<Result<Vec<Status>, _>>()?;
        let filter = TaskFilter::builder()
            .search(params.search.clone().unwrap_or_default())
            .priorities(priorities)
            .statuses(statuses)
            .build();
        Ok(Self { page: PageRequest::new(page, limit)?, filter })
    }

    /// Inverse of [`ListQuery::parse`], used by the client to build request URLs.
    pub fn to_params(&self) -> ListParams {
        let join = |names: Vec<&str>| if names.is_empty() { None } else { Some(names.join(",")) };
        ListParams {
            page: Some(self.page.page().to_string()),
            limit: Some(self.page.limit().to_string()),
            search: self.filter.search().map(str::to_string),
            priority: join(self.filter.priorities().iter().map(|p| p.as_str()).collect()),
            status: join(self.filter.statuses().iter().map(|s| s.as_str()).collect()),
        }
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default().split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Aggregation payload for one list request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub total_tasks: u64,
    pub priority_counts: BTreeMap<Priority, u64>,
    pub status_counts: BTreeMap<Status, u64>,
    pub priority_status_counts: BTreeMap<Priority, BTreeMap<Status, u64>>,
}

impl TaskPage {
    pub fn empty() -> Self {
        Self {
            tasks: Vec::new(),
            current_page: DEFAULT_PAGE,
            total_pages: 0,
            total_count: 0,
            total_tasks: 0,
            priority_counts: zeroed(Priority::ALL),
            status_counts: zeroed(Status::ALL),
            priority_status_counts: Priority::ALL.into_iter().map(|p| (p, zeroed(Status::ALL))).collect(),
        }
    }
}

pub(crate) fn zeroed<K: Ord, const N: usize>(keys: [K; N]) -> BTreeMap<K, u64> {
    keys.into_iter().map(|k| (k, 0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let mut p = ListParams::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "page" => p.page = v,
                "limit" => p.limit = v,
                "search" => p.search = v,
                "priority" => p.priority = v,
                "status" => p.status = v,
                _ => unreachable!(),
            }
        }
        p
    }

    #[test]
    fn defaults_when_params_missing() {
        let q = ListQuery::parse(&ListParams::default()).unwrap();
        assert_eq!(q.page.page(), 1);
        assert_eq!(q.page.limit(), 10);
        assert_eq!(q.filter, TaskFilter::default());
    }

    #[test]
    fn parses_comma_separated_filters() {
        let q = ListQuery::parse(&params(&[("priority", "Low, Critical,,"), ("status", "Done")])).unwrap();
        assert_eq!(q.filter.priorities().iter().copied().collect::<Vec<_>>(), vec![Priority::Low, Priority::Critical]);
        assert_eq!(q.filter.statuses().iter().copied().collect::<Vec<_>>(), vec![Status::Done]);
    }

    #[test]
    fn status_all_means_unfiltered() {
        let q = ListQuery::parse(&params(&[("status", "all")])).unwrap();
        assert!(q.filter.statuses().is_empty());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(ListQuery::parse(&params(&[("page", "0")])), Err(QueryError::Page(_))));
        assert!(matches!(ListQuery::parse(&params(&[("page", "-2")])), Err(QueryError::Page(_))));
        assert!(matches!(ListQuery::parse(&params(&[("limit", "0")])), Err(QueryError::Limit(_))));
        assert!(matches!(ListQuery::parse(&params(&[("limit", "abc")])), Err(QueryError::Limit(_))));
        assert!(matches!(ListQuery::parse(&params(&[("limit", "-5")])), Err(QueryError::Limit(_))));
        assert!(matches!(ListQuery::parse(&params(&[("priority", "Urgent")])), Err(QueryError::Filter(_))));
    }

    #[test]
    fn large_limits_are_accepted() {
        let q = ListQuery::parse(&params(&[("limit", "500")])).unwrap();
        assert_eq!(q.page.limit(), 500);
        assert_eq!(q.page.total_pages(501), 2);
    }

    #[test]
    fn offset_and_total_pages() {
        let p = PageRequest::new(3, 5).unwrap();
        assert_eq!(p.offset(), 10);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(5), 1);
        assert_eq!(p.total_pages(11), 3);
    }

    #[test]
    fn to_params_round_trips_through_parse() {
        let q = ListQuery {
            page: PageRequest::new(2, 5).unwrap(),
            filter: TaskFilter::builder().search("bug").priorities([Priority::Important]).statuses([Status::Todo, Status::Progress]).build(),
        };
        let p = q.to_params();
        assert_eq!(p.priority.as_deref(), Some("Important"));
        assert_eq!(p.status.as_deref(), Some("Todo,Progress"));
        assert_eq!(ListQuery::parse(&p).unwrap(), q);
    }

    #[test]
    fn without_status_keeps_other_constraints() {
        let f = TaskFilter::builder().search("a").priorities([Priority::Low]).statuses([Status::Done]).build();
        let g = f.without_status();
        assert_eq!(g.search(), Some("a"));
        assert_eq!(g.priorities().len(), 1);
        assert!(g.statuses().is_empty());
    }
}
