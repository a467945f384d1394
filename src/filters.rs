use clap::Args;
use tracing::warn;

use crate::models::PlacementRow;

/// Selection value meaning "no restriction".
pub const ALL: &str = "All";

/// Filter record as typed by a user; every field is free text.
#[derive(Args, Debug, Clone, Default)]
pub struct RawFilters {
    /// Only rows for this branch
    #[arg(long)]
    pub branch: Option<String>,
    /// Only rows for this batch
    #[arg(long)]
    pub batch: Option<String>,
    /// Only rows for this company ("All" for any)
    #[arg(long)]
    pub company: Option<String>,
    /// Only rows with this status (Accepted, Pending, Declined, Not Placed)
    #[arg(long)]
    pub status: Option<String>,
    /// Minimum package in LPA (inclusive)
    #[arg(long)]
    pub package_above: Option<String>,
    /// Maximum package in LPA (inclusive)
    #[arg(long)]
    pub package_below: Option<String>,
}

impl RawFilters {
    pub fn normalize(&self) -> ReportFilters {
        ReportFilters {
            branch: selection(self.branch.as_deref()),
            batch: selection(self.batch.as_deref()),
            company: selection(self.company.as_deref()),
            status: selection(self.status.as_deref()),
            package_above: threshold("package_above", self.package_above.as_deref()),
            package_below: threshold("package_below", self.package_below.as_deref()),
        }
    }
}

fn selection(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.is_empty() && *value != ALL)
        .map(str::to_string)
}

fn threshold(field: &str, value: Option<&str>) -> Option<f64> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }

    match raw.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(parsed),
        _ => {
            warn!(field, value = raw, "ignoring unparsable package threshold");
            None
        }
    }
}

/// Coerced filters. `None` means the predicate is not applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilters {
    pub branch: Option<String>,
    pub batch: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub package_above: Option<f64>,
    pub package_below: Option<f64>,
}

impl ReportFilters {
    pub fn is_empty(&self) -> bool {
        *self == ReportFilters::default()
    }

    pub fn matches(&self, row: &PlacementRow) -> bool {
        self.branch.as_deref().map_or(true, |branch| row.branch == branch)
            && self.batch.as_deref().map_or(true, |batch| row.batch == batch)
            && self
                .company
                .as_deref()
                .map_or(true, |company| row.company_name == company)
            && self
                .status
                .as_deref()
                .map_or(true, |status| row.status.label() == status)
            && self.package_above.map_or(true, |min| row.package >= min)
            && self.package_below.map_or(true, |max| row.package <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OfferStatus, PlacementStatus};

    fn row(branch: &str, company: &str, package: f64, status: PlacementStatus) -> PlacementRow {
        PlacementRow {
            student_id: "1".to_string(),
            student_name: "Rahul Sharma".to_string(),
            roll_number: "SVIT20CS001".to_string(),
            branch: branch.to_string(),
            batch: "2020-2024".to_string(),
            company_name: company.to_string(),
            company_industry: "IT Services".to_string(),
            role: "Software Engineer".to_string(),
            package,
            offer_date: "2023-12-10".to_string(),
            status,
        }
    }

    #[test]
    fn empty_and_all_values_are_dropped() {
        let raw = RawFilters {
            branch: Some(String::new()),
            batch: None,
            company: Some("All".to_string()),
            status: Some("All".to_string()),
            package_above: Some("  ".to_string()),
            package_below: None,
        };
        assert!(raw.normalize().is_empty());
    }

    #[test]
    fn unparsable_thresholds_are_ignored() {
        let raw = RawFilters {
            package_above: Some("ten".to_string()),
            package_below: Some("NaN".to_string()),
            ..RawFilters::default()
        };
        let filters = raw.normalize();
        assert_eq!(filters.package_above, None);
        assert_eq!(filters.package_below, None);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let raw = RawFilters {
            package_above: Some("7.5".to_string()),
            package_below: Some(" 7.5 ".to_string()),
            ..RawFilters::default()
        };
        let filters = raw.normalize();
        let accepted = PlacementStatus::Offer(OfferStatus::Accepted);
        assert!(filters.matches(&row("CS", "TCS", 7.5, accepted)));
        assert!(!filters.matches(&row("CS", "TCS", 7.6, accepted)));
    }

    #[test]
    fn status_matches_not_placed_label() {
        let filters = RawFilters {
            status: Some("Not Placed".to_string()),
            ..RawFilters::default()
        }
        .normalize();
        assert!(filters.matches(&row("CS", "Not Placed", 0.0, PlacementStatus::NotPlaced)));
        assert!(!filters.matches(&row(
            "CS",
            "TCS",
            7.5,
            PlacementStatus::Offer(OfferStatus::Pending)
        )));
    }

    #[test]
    fn predicates_are_combined_with_and() {
        let filters = RawFilters {
            branch: Some("CS".to_string()),
            company: Some("TCS".to_string()),
            ..RawFilters::default()
        }
        .normalize();
        let accepted = PlacementStatus::Offer(OfferStatus::Accepted);
        assert!(filters.matches(&row("CS", "TCS", 7.5, accepted)));
        assert!(!filters.matches(&row("EC", "TCS", 7.5, accepted)));
        assert!(!filters.matches(&row("CS", "Infosys", 7.5, accepted)));
    }
}
