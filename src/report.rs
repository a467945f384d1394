use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use crate::filters::ReportFilters;
use crate::models::{
    BatchRow, BranchRow, Cell, Company, CompanyRow, HighPackageRow, Offer, OfferStatus,
    PlacementOutcome, PlacementRow, PlacementStatus, ReportRecord, Student, StudentPerformanceRow,
};
use crate::stats::{best_accepted_package, mean, PlacementTally};

pub const CUSTOM_REPORT_TITLE: &str = "Custom Placement Report";
/// Offers at or above this package (LPA) make the high package report.
pub const HIGH_PACKAGE_THRESHOLD: f64 = 10.0;

const NOT_AVAILABLE: &str = "N/A";
const NOT_PLACED: &str = "Not Placed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    HighPackage,
    BranchWise,
    CompanyWise,
    BatchWise,
    StudentPerformance,
    All,
}

impl ReportKind {
    pub fn ordered() -> [ReportKind; 6] {
        [
            ReportKind::HighPackage,
            ReportKind::BranchWise,
            ReportKind::CompanyWise,
            ReportKind::BatchWise,
            ReportKind::StudentPerformance,
            ReportKind::All,
        ]
    }

    pub fn selector(self) -> &'static str {
        match self {
            ReportKind::HighPackage => "highPackage",
            ReportKind::BranchWise => "branchWise",
            ReportKind::CompanyWise => "companyWise",
            ReportKind::BatchWise => "batchWise",
            ReportKind::StudentPerformance => "studentPerformance",
            ReportKind::All => "all",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ReportKind::HighPackage => "High Package Offers (Above 10 LPA)",
            ReportKind::BranchWise => "Branch-wise Placement Statistics",
            ReportKind::CompanyWise => "Company-wise Recruitment Statistics",
            ReportKind::BatchWise => "Batch-wise Placement Statistics",
            ReportKind::StudentPerformance => "Student Performance Report",
            ReportKind::All => "All Placement Data",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ReportKind::ordered()
            .into_iter()
            .find(|kind| kind.selector().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = ReportKind::ordered()
                    .iter()
                    .map(|kind| kind.selector())
                    .collect();
                format!("unknown report '{value}' (expected one of {})", known.join(", "))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportRows {
    Placement(Vec<PlacementRow>),
    HighPackage(Vec<HighPackageRow>),
    Branch(Vec<BranchRow>),
    Company(Vec<CompanyRow>),
    Batch(Vec<BatchRow>),
    StudentPerformance(Vec<StudentPerformanceRow>),
}

fn records_of<R: ReportRecord>(rows: &[R]) -> Vec<Vec<(&'static str, Cell)>> {
    rows.iter().map(ReportRecord::cells).collect()
}

impl ReportRows {
    pub fn len(&self) -> usize {
        match self {
            ReportRows::Placement(rows) => rows.len(),
            ReportRows::HighPackage(rows) => rows.len(),
            ReportRows::Branch(rows) => rows.len(),
            ReportRows::Company(rows) => rows.len(),
            ReportRows::Batch(rows) => rows.len(),
            ReportRows::StudentPerformance(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every row as ordered `(column, value)` pairs.
    pub fn records(&self) -> Vec<Vec<(&'static str, Cell)>> {
        match self {
            ReportRows::Placement(rows) => records_of(rows),
            ReportRows::HighPackage(rows) => records_of(rows),
            ReportRows::Branch(rows) => records_of(rows),
            ReportRows::Company(rows) => records_of(rows),
            ReportRows::Batch(rows) => records_of(rows),
            ReportRows::StudentPerformance(rows) => records_of(rows),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub rows: ReportRows,
}

impl Report {
    pub fn custom(rows: Vec<PlacementRow>) -> Self {
        Self {
            title: CUSTOM_REPORT_TITLE.to_string(),
            rows: ReportRows::Placement(rows),
        }
    }
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Distinct branches in first-seen order.
pub fn unique_branches(students: &[Student]) -> Vec<String> {
    unique_by(students, |student| &student.branch)
}

/// Distinct batches in first-seen order.
pub fn unique_batches(students: &[Student]) -> Vec<String> {
    unique_by(students, |student| &student.batch)
}

fn unique_by<'a>(students: &'a [Student], key: impl Fn(&'a Student) -> &'a String) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for student in students {
        let value = key(student);
        if !values.contains(value) {
            values.push(value.clone());
        }
    }
    values
}

fn industry_of(companies: &[Company], company_name: &str) -> String {
    companies
        .iter()
        .find(|company| company.name == company_name)
        .map(|company| company.industry.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn placement_row(student: &Student, offer: &Offer, companies: &[Company]) -> PlacementRow {
    PlacementRow {
        student_id: student.id.clone(),
        student_name: student.name.clone(),
        roll_number: student.roll_number.clone(),
        branch: student.branch.clone(),
        batch: student.batch.clone(),
        company_name: offer.company_name.clone(),
        company_industry: industry_of(companies, &offer.company_name),
        role: offer.role.clone(),
        package: offer.package,
        offer_date: offer.offer_date.clone(),
        status: PlacementStatus::Offer(offer.status),
    }
}

fn not_placed_row(student: &Student) -> PlacementRow {
    PlacementRow {
        student_id: student.id.clone(),
        student_name: student.name.clone(),
        roll_number: student.roll_number.clone(),
        branch: student.branch.clone(),
        batch: student.batch.clone(),
        company_name: NOT_PLACED.to_string(),
        company_industry: NOT_AVAILABLE.to_string(),
        role: NOT_AVAILABLE.to_string(),
        package: 0.0,
        offer_date: NOT_AVAILABLE.to_string(),
        status: PlacementStatus::NotPlaced,
    }
}

/// The `all` report fills blanks left by incomplete student or offer records.
fn with_all_defaults(row: PlacementRow) -> PlacementRow {
    PlacementRow {
        roll_number: or_default(&row.roll_number, NOT_AVAILABLE),
        company_name: or_default(&row.company_name, NOT_PLACED),
        role: or_default(&row.role, NOT_AVAILABLE),
        ..row
    }
}

/// One row per offer, or a single "Not Placed" row for a student without offers.
fn join_placements(students: &[Student], offers: &[Offer], companies: &[Company]) -> Vec<PlacementRow> {
    let mut rows = Vec::with_capacity(students.len().max(offers.len()));

    for student in students {
        let before = rows.len();
        rows.extend(
            offers
                .iter()
                .filter(|offer| offer.student_id == student.id)
                .map(|offer| placement_row(student, offer, companies)),
        );
        if rows.len() == before {
            rows.push(not_placed_row(student));
        }
    }

    rows
}

pub fn build_placement_report(
    students: &[Student],
    offers: &[Offer],
    companies: &[Company],
    filters: &ReportFilters,
) -> Vec<PlacementRow> {
    let rows: Vec<PlacementRow> = join_placements(students, offers, companies)
        .into_iter()
        .filter(|row| filters.matches(row))
        .collect();

    info!(rows = rows.len(), filtered = !filters.is_empty(), "built placement report");
    rows
}

pub fn build_predefined_report(
    kind: ReportKind,
    students: &[Student],
    offers: &[Offer],
    companies: &[Company],
    branches: &[String],
    batches: &[String],
) -> Report {
    let rows = match kind {
        ReportKind::HighPackage => ReportRows::HighPackage(high_package_rows(students, offers)),
        ReportKind::BranchWise => ReportRows::Branch(branch_rows(students, offers, branches)),
        ReportKind::CompanyWise => ReportRows::Company(company_rows(offers, companies)),
        ReportKind::BatchWise => ReportRows::Batch(batch_rows(students, offers, batches)),
        ReportKind::StudentPerformance => {
            ReportRows::StudentPerformance(student_performance_rows(students, offers))
        }
        ReportKind::All => ReportRows::Placement(
            join_placements(students, offers, companies)
                .into_iter()
                .map(with_all_defaults)
                .collect(),
        ),
    };

    info!(report = %kind, rows = rows.len(), "built predefined report");
    Report {
        title: kind.title().to_string(),
        rows,
    }
}

fn high_package_rows(students: &[Student], offers: &[Offer]) -> Vec<HighPackageRow> {
    let missing = Student::default();
    offers
        .iter()
        .filter(|offer| offer.package >= HIGH_PACKAGE_THRESHOLD)
        .map(|offer| {
            let student = students
                .iter()
                .find(|student| student.id == offer.student_id)
                .unwrap_or(&missing);

            HighPackageRow {
                student_id: student.id.clone(),
                student_name: or_default(&student.name, "Unknown Student"),
                roll_number: or_default(&student.roll_number, NOT_AVAILABLE),
                branch: or_default(&student.branch, NOT_AVAILABLE),
                batch: or_default(&student.batch, NOT_AVAILABLE),
                company_name: or_default(&offer.company_name, "Unknown Company"),
                role: or_default(&offer.role, NOT_AVAILABLE),
                package: offer.package,
                offer_date: or_default(&offer.offer_date, NOT_AVAILABLE),
                status: offer.status,
            }
        })
        .collect()
}

/// Tallies students per group key; groups not listed in `keys` are ignored.
fn tally_groups<'a>(
    keys: &'a [String],
    students: &[Student],
    offers: &[Offer],
    group_of: impl Fn(&Student) -> &str,
) -> Vec<(&'a str, PlacementTally)> {
    let mut tallies: Vec<(&str, PlacementTally)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        if !index.contains_key(key.as_str()) {
            index.insert(key.as_str(), tallies.len());
            tallies.push((key.as_str(), PlacementTally::default()));
        }
    }

    for student in students {
        if let Some(&slot) = index.get(group_of(student)) {
            tallies[slot]
                .1
                .record(best_accepted_package(&student.id, offers));
        }
    }

    tallies
}

fn branch_rows(students: &[Student], offers: &[Offer], branches: &[String]) -> Vec<BranchRow> {
    tally_groups(branches, students, offers, |student| student.branch.as_str())
        .into_iter()
        .map(|(branch, tally)| BranchRow {
            branch: branch.to_string(),
            total_students: tally.total_students,
            placed: tally.placed,
            placement_rate: tally.placement_rate(),
            avg_package: tally.avg_package(),
            highest_package: tally.highest_package(),
            lowest_package: tally.lowest_package(),
        })
        .collect()
}

fn batch_rows(students: &[Student], offers: &[Offer], batches: &[String]) -> Vec<BatchRow> {
    tally_groups(batches, students, offers, |student| student.batch.as_str())
        .into_iter()
        .map(|(batch, tally)| BatchRow {
            batch: batch.to_string(),
            total_students: tally.total_students,
            placed: tally.placed,
            placement_rate: tally.placement_rate(),
            avg_package: tally.avg_package(),
            highest_package: tally.highest_package(),
        })
        .collect()
}

#[derive(Debug, Default)]
struct CompanyTally {
    extended: usize,
    accepted: usize,
    pending: usize,
    declined: usize,
    package_sum: f64,
    highest: Option<f64>,
    lowest: Option<f64>,
}

fn company_rows(offers: &[Offer], companies: &[Company]) -> Vec<CompanyRow> {
    let mut tallies: Vec<(&Company, CompanyTally)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for company in companies {
        if !index.contains_key(company.name.as_str()) {
            index.insert(company.name.as_str(), tallies.len());
            tallies.push((company, CompanyTally::default()));
        }
    }

    for offer in offers {
        let Some(&slot) = index.get(offer.company_name.as_str()) else {
            continue;
        };
        let tally = &mut tallies[slot].1;
        tally.extended += 1;
        match offer.status {
            OfferStatus::Accepted => tally.accepted += 1,
            OfferStatus::Pending => tally.pending += 1,
            OfferStatus::Declined => tally.declined += 1,
        }
        tally.package_sum += offer.package;
        tally.highest = Some(tally.highest.map_or(offer.package, |v| v.max(offer.package)));
        tally.lowest = Some(tally.lowest.map_or(offer.package, |v| v.min(offer.package)));
    }

    tallies
        .into_iter()
        .filter(|(_, tally)| tally.extended > 0)
        .map(|(company, tally)| CompanyRow {
            company_name: company.name.clone(),
            industry: or_default(&company.industry, NOT_AVAILABLE),
            offers_extended: tally.extended,
            offers_accepted: tally.accepted,
            offers_pending: tally.pending,
            offers_declined: tally.declined,
            avg_package: mean(tally.package_sum, tally.extended),
            highest_package: tally.highest.unwrap_or(0.0),
            lowest_package: tally.lowest.unwrap_or(0.0),
        })
        .collect()
}

fn student_performance_rows(students: &[Student], offers: &[Offer]) -> Vec<StudentPerformanceRow> {
    let mut rows: Vec<StudentPerformanceRow> = students
        .iter()
        .filter_map(|student| {
            let received: Vec<&Offer> = offers
                .iter()
                .filter(|offer| offer.student_id == student.id)
                .collect();
            if received.is_empty() {
                return None;
            }

            let accepted = received
                .iter()
                .find(|offer| offer.status == OfferStatus::Accepted);
            let highest_package = received
                .iter()
                .fold(0.0_f64, |max, offer| max.max(offer.package));

            Some(StudentPerformanceRow {
                student_id: student.id.clone(),
                student_name: or_default(&student.name, "Unknown Student"),
                roll_number: or_default(&student.roll_number, NOT_AVAILABLE),
                branch: or_default(&student.branch, NOT_AVAILABLE),
                batch: or_default(&student.batch, NOT_AVAILABLE),
                offers_received: received.len(),
                highest_package,
                accepted_package: accepted.map_or(0.0, |offer| offer.package),
                accepted_company: accepted
                    .map_or_else(|| "None".to_string(), |offer| offer.company_name.clone()),
                status: if accepted.is_some() {
                    PlacementOutcome::Placed
                } else {
                    PlacementOutcome::NotPlaced
                },
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.offers_received.cmp(&a.offers_received).then_with(|| {
            b.highest_package
                .partial_cmp(&a.highest_package)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });
    rows
}
