//! Filter / sort / paginate pipeline
//!
//! Pure functions that turn the current queue plus view state into the page
//! of records to render, and the `Pager` state machine that tracks the page.
//!
//! Filtering precedence:
//! 1. A doctor override keeps only records assigned to that doctor
//! 2. Otherwise the `mine` tab keeps records assigned to the current doctor
//! 3. Otherwise every record is kept
//!
//! Sorting is stable by severity, so records of equal severity keep their
//! backend order.

use super::error::{QueueError, QueueResult};
use super::types::PatientRecord;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Records shown per page
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Role tab of the queue view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueTab {
    /// Patients assigned to the current doctor
    #[default]
    #[serde(alias = "my_queue")]
    Mine,
    /// Whole queue
    All,
}

impl FromStr for QueueTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mine" | "my_queue" => Ok(QueueTab::Mine),
            "all" => Ok(QueueTab::All),
            other => Err(format!("Unknown queue tab: {}", other)),
        }
    }
}

/// Ephemeral view state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueFilter {
    #[serde(default)]
    pub tab: QueueTab,
    /// Exact doctor name that overrides the tab
    #[serde(default)]
    pub doctor: Option<String>,
}

impl QueueFilter {
    pub fn tab(tab: QueueTab) -> Self {
        Self { tab, doctor: None }
    }

    pub fn doctor(name: impl Into<String>) -> Self {
        Self {
            tab: QueueTab::Mine,
            doctor: Some(name.into()),
        }
    }
}

/// One rendered page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuePage {
    pub records: Vec<PatientRecord>,
    pub page: u32,
    pub total_pages: u32,
    pub total_matching: usize,
    pub page_size: usize,
}

/// Keep the records the filter selects, in queue order
pub fn filter_records<'a>(
    records: &'a [PatientRecord],
    filter: &QueueFilter,
    current_doctor: Option<&str>,
) -> Vec<&'a PatientRecord> {
    let wanted = match (filter.doctor.as_deref(), filter.tab, current_doctor) {
        (Some(doctor), _, _) => Some(doctor),
        (None, QueueTab::Mine, Some(current)) => Some(current),
        _ => None,
    };

    match wanted {
        Some(doctor) => records.iter().filter(|r| r.is_assigned_to(doctor)).collect(),
        None => records.iter().collect(),
    }
}

/// Stable sort: High first, then Medium, then everything else
pub fn sort_by_severity(records: &mut [&PatientRecord]) {
    records.sort_by_key(|r| r.severity());
}

/// Number of pages for `count` records; zero for an empty list
pub fn total_pages(count: usize, page_size: usize) -> u32 {
    if page_size == 0 || count == 0 {
        return 0;
    }
    count.div_ceil(page_size) as u32
}

/// Run the full pipeline and return the requested 1-indexed page
///
/// Out-of-range pages produce an empty slice; rejecting them is the pager's job.
pub fn compute_page(
    records: &[PatientRecord],
    filter: &QueueFilter,
    current_doctor: Option<&str>,
    page: u32,
    page_size: usize,
) -> QueuePage {
    let mut matching = filter_records(records, filter, current_doctor);
    sort_by_severity(&mut matching);

    let total_matching = matching.len();
    let total_pages = total_pages(total_matching, page_size);

    let slice: Vec<PatientRecord> = if page == 0 || page > total_pages {
        Vec::new()
    } else {
        let start = (page as usize - 1) * page_size;
        matching
            .into_iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect()
    };

    QueuePage {
        records: slice,
        page,
        total_pages,
        total_matching,
        page_size,
    }
}

/// Badge counts for the role tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabCounts {
    pub mine: usize,
    pub all: usize,
}

impl TabCounts {
    pub fn compute(records: &[PatientRecord], current_doctor: Option<&str>) -> Self {
        let mine = match current_doctor {
            Some(doctor) => records.iter().filter(|r| r.is_assigned_to(doctor)).count(),
            None => 0,
        };
        Self {
            mine,
            all: records.len(),
        }
    }
}

/// Per-doctor summary: assigned patients and how many are high risk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorOverview {
    pub doctor: String,
    pub assigned: usize,
    pub high_risk: usize,
}

impl DoctorOverview {
    pub fn compute(records: &[PatientRecord], doctor: &str) -> Self {
        let mine: Vec<&PatientRecord> = records
            .iter()
            .filter(|r| r.is_assigned_to(doctor))
            .collect();
        Self {
            doctor: doctor.to_string(),
            assigned: mine.len(),
            high_risk: mine.iter().filter(|r| r.is_high_risk()).count(),
        }
    }
}

/// Current page of the view
///
/// Moves that would leave `[1, total_pages]` are rejected and leave the state
/// unchanged. The page is never clamped when the total shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    current: u32,
}

impl Default for Pager {
    fn default() -> Self {
        Self { current: 1 }
    }
}

impl Pager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn go_to(&mut self, target: u32, total_pages: u32) -> QueueResult<u32> {
        if target < 1 || target > total_pages {
            return Err(QueueError::PageOutOfRange {
                requested: target,
                total_pages,
            });
        }
        self.current = target;
        Ok(self.current)
    }

    pub fn next(&mut self, total_pages: u32) -> QueueResult<u32> {
        self.go_to(self.current.saturating_add(1), total_pages)
    }

    pub fn previous(&mut self, total_pages: u32) -> QueueResult<u32> {
        self.go_to(self.current.saturating_sub(1), total_pages)
    }

    /// Back to page 1
    pub fn reset(&mut self) {
        self.current = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::types::PatientId;

    fn ids(records: &[PatientRecord]) -> Vec<PatientId> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    fn mixed_queue() -> Vec<PatientRecord> {
        vec![
            PatientRecord::new(1).risk_level("Low").assigned_to("Dr. A"),
            PatientRecord::new(2).predicted_risk("High").assigned_to("Dr. B"),
            PatientRecord::new(3).risk_level("Medium").assigned_to("Dr. A"),
            PatientRecord::new(4).assigned_to("Dr. A"),
            PatientRecord::new(5).predicted_risk("High").assigned_to("Dr. A"),
        ]
    }

    #[test]
    fn test_sort_is_stable_by_severity() {
        let records = vec![
            PatientRecord::new("h1").risk_level("High"),
            PatientRecord::new("l").risk_level("Low"),
            PatientRecord::new("h3").risk_level("High"),
            PatientRecord::new("m").risk_level("Medium"),
        ];

        let page = compute_page(&records, &QueueFilter::tab(QueueTab::All), None, 1, 9);
        assert_eq!(
            ids(&page.records),
            vec![
                PatientId::from("h1"),
                PatientId::from("h3"),
                PatientId::from("m"),
                PatientId::from("l")
            ]
        );
    }

    #[test]
    fn test_predicted_risk_reorders_push() {
        let records = vec![
            PatientRecord::new(1).risk_level("Low"),
            PatientRecord::new(2).predicted_risk("High"),
        ];

        let page = compute_page(&records, &QueueFilter::tab(QueueTab::All), None, 1, 9);
        assert_eq!(ids(&page.records), vec![PatientId::from(2), PatientId::from(1)]);
    }

    #[test]
    fn test_unset_risk_ranks_with_low() {
        let records = vec![
            PatientRecord::new(1),
            PatientRecord::new(2).risk_level("Low"),
            PatientRecord::new(3).risk_level("Urgent"),
            PatientRecord::new(4).risk_level("Medium"),
        ];

        let page = compute_page(&records, &QueueFilter::default(), None, 1, 9);
        assert_eq!(
            ids(&page.records),
            vec![
                PatientId::from(4),
                PatientId::from(1),
                PatientId::from(2),
                PatientId::from(3)
            ]
        );
    }

    #[test]
    fn test_doctor_override_is_exact() {
        let records = mixed_queue();
        let filter = QueueFilter::doctor("Dr. A");

        let page = compute_page(&records, &filter, Some("Dr. B"), 1, 9);
        assert_eq!(page.total_matching, 4);
        assert!(page.records.iter().all(|r| r.is_assigned_to("Dr. A")));

        let none = compute_page(&records, &QueueFilter::doctor("dr. a"), None, 1, 9);
        assert_eq!(none.total_matching, 0);
        assert_eq!(none.total_pages, 0);
    }

    #[test]
    fn test_mine_tab_needs_current_doctor() {
        let records = mixed_queue();
        let filter = QueueFilter::tab(QueueTab::Mine);

        let mine = compute_page(&records, &filter, Some("Dr. B"), 1, 9);
        assert_eq!(ids(&mine.records), vec![PatientId::from(2)]);

        let everyone = compute_page(&records, &filter, None, 1, 9);
        assert_eq!(everyone.total_matching, records.len());
    }

    #[test]
    fn test_compute_is_pure() {
        let records = mixed_queue();
        let before = records.clone();
        let filter = QueueFilter::tab(QueueTab::All);

        let first = compute_page(&records, &filter, Some("Dr. A"), 1, 2);
        let second = compute_page(&records, &filter, Some("Dr. A"), 1, 2);

        assert_eq!(first, second);
        assert_eq!(records, before);
    }

    #[test]
    fn test_pagination_slices() {
        let records: Vec<PatientRecord> = (0..20i64).map(PatientRecord::new).collect();
        let filter = QueueFilter::tab(QueueTab::All);

        let first = compute_page(&records, &filter, None, 1, DEFAULT_PAGE_SIZE);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.records.len(), 9);

        let last = compute_page(&records, &filter, None, 3, DEFAULT_PAGE_SIZE);
        assert_eq!(ids(&last.records), vec![PatientId::from(18), PatientId::from(19)]);

        let beyond = compute_page(&records, &filter, None, 4, DEFAULT_PAGE_SIZE);
        assert!(beyond.records.is_empty());
        assert!(compute_page(&records, &filter, None, 0, DEFAULT_PAGE_SIZE)
            .records
            .is_empty());
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 9), 0);
        assert_eq!(total_pages(1, 9), 1);
        assert_eq!(total_pages(9, 9), 1);
        assert_eq!(total_pages(10, 9), 2);
        assert_eq!(total_pages(10, 0), 0);
    }

    #[test]
    fn test_pager_rejects_out_of_range() {
        let mut pager = Pager::new();

        assert_eq!(
            pager.previous(3),
            Err(QueueError::PageOutOfRange {
                requested: 0,
                total_pages: 3
            })
        );
        assert_eq!(pager.current(), 1);

        assert_eq!(pager.go_to(3, 3), Ok(3));
        assert!(pager.next(3).is_err());
        assert_eq!(pager.current(), 3);

        assert!(pager.go_to(0, 3).is_err());
        assert!(pager.go_to(4, 3).is_err());
        assert_eq!(pager.current(), 3);
    }

    #[test]
    fn test_pager_does_not_clamp_when_total_shrinks() {
        let mut pager = Pager::new();
        pager.go_to(3, 3).unwrap();

        // Total shrinks to one page: the pager stays put and further moves fail
        assert_eq!(pager.current(), 3);
        assert!(pager.next(1).is_err());
        assert_eq!(
            pager.previous(1),
            Err(QueueError::PageOutOfRange {
                requested: 2,
                total_pages: 1
            })
        );
        assert_eq!(pager.current(), 3);
        assert_eq!(pager.go_to(1, 1), Ok(1));
    }

    #[test]
    fn test_pager_on_empty_queue() {
        let mut pager = Pager::new();
        assert!(pager.next(0).is_err());
        assert!(pager.go_to(1, 0).is_err());
        assert_eq!(pager.current(), 1);
    }

    #[test]
    fn test_tab_counts_and_overview() {
        let records = mixed_queue();

        let counts = TabCounts::compute(&records, Some("Dr. A"));
        assert_eq!(counts, TabCounts { mine: 4, all: 5 });
        assert_eq!(TabCounts::compute(&records, None).mine, 0);

        let overview = DoctorOverview::compute(&records, "Dr. A");
        assert_eq!(overview.assigned, 4);
        assert_eq!(overview.high_risk, 1);
    }

    #[test]
    fn test_tab_parsing() {
        assert_eq!("my_queue".parse::<QueueTab>().unwrap(), QueueTab::Mine);
        assert_eq!("ALL".parse::<QueueTab>().unwrap(), QueueTab::All);
        assert!("others".parse::<QueueTab>().is_err());
        assert_eq!(QueueTab::default(), QueueTab::Mine);
    }
}
