use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub roll_number: String,
    pub branch: String,
    pub batch: String,
    pub email: String,
    pub phone: String,
}

/// Offers reference a company by `name`, not by `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub industry: String,
    pub contact: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl OfferStatus {
    pub fn label(self) -> &'static str {
        match self {
            OfferStatus::Pending => "Pending",
            OfferStatus::Accepted => "Accepted",
            OfferStatus::Declined => "Declined",
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for OfferStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OfferStatus::Pending),
            "accepted" => Ok(OfferStatus::Accepted),
            "declined" => Ok(OfferStatus::Declined),
            other => Err(format!(
                "unknown offer status '{other}' (expected Pending, Accepted or Declined)"
            )),
        }
    }
}

/// An uploaded file kept inline as a data URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub student_id: String,
    pub company_name: String,
    pub role: String,
    /// Annual package in LPA.
    pub package: f64,
    pub offer_date: String,
    pub status: OfferStatus,
    pub offer_letter: Option<Attachment>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    #[default]
    Student,
    Company,
    Placement,
    General,
}

impl std::str::FromStr for InputType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(InputType::Student),
            "company" => Ok(InputType::Company),
            "placement" => Ok(InputType::Placement),
            "general" => Ok(InputType::General),
            other => Err(format!("unknown input type '{other}'")),
        }
    }
}

/// Feedback submitted through the input collection page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Input {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InputType,
    pub title: String,
    pub message: String,
    pub student_id: Option<String>,
    pub company_id: Option<String>,
    pub attachment: Option<Attachment>,
    pub submitted_by: String,
    pub submitted_by_role: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Row-level status: an offer status, or the marker for a student without offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStatus {
    Offer(OfferStatus),
    NotPlaced,
}

impl PlacementStatus {
    pub fn label(self) -> &'static str {
        match self {
            PlacementStatus::Offer(status) => status.label(),
            PlacementStatus::NotPlaced => "Not Placed",
        }
    }
}

impl Serialize for PlacementStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    Placed,
    NotPlaced,
}

impl PlacementOutcome {
    pub fn label(self) -> &'static str {
        match self {
            PlacementOutcome::Placed => "Placed",
            PlacementOutcome::NotPlaced => "Not Placed",
        }
    }
}

impl Serialize for PlacementOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// A single rendered value in a report column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Count(usize),
    Number(f64),
    /// A value shown with exactly two decimals.
    Fixed2(f64),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Text(_) => None,
            Cell::Count(value) => Some(*value as f64),
            Cell::Number(value) | Cell::Fixed2(value) => Some(*value),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(value) => f.write_str(value),
            Cell::Count(value) => write!(f, "{value}"),
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Fixed2(value) => write!(f, "{value:.2}"),
        }
    }
}

fn text(value: &str) -> Cell {
    Cell::Text(value.to_string())
}

/// A two-decimal figure, or a bare `0` when there was nothing to divide by.
fn fixed2(value: Option<f64>) -> Cell {
    value.map_or(Cell::Count(0), Cell::Fixed2)
}

/// Column-ordered view of a report row. Keys are the export header names.
pub trait ReportRecord {
    fn cells(&self) -> Vec<(&'static str, Cell)>;
}

/// `Some` becomes a two-decimal string, `None` the number 0.
pub fn serialize_fixed2<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.serialize_str(&format!("{value:.2}")),
        None => serializer.serialize_u64(0),
    }
}

/// One student joined with one of their offers, or with nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRow {
    pub student_id: String,
    pub student_name: String,
    pub roll_number: String,
    pub branch: String,
    pub batch: String,
    pub company_name: String,
    pub company_industry: String,
    pub role: String,
    pub package: f64,
    pub offer_date: String,
    pub status: PlacementStatus,
}

impl ReportRecord for PlacementRow {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("studentId", text(&self.student_id)),
            ("studentName", text(&self.student_name)),
            ("rollNumber", text(&self.roll_number)),
            ("branch", text(&self.branch)),
            ("batch", text(&self.batch)),
            ("companyName", text(&self.company_name)),
            ("companyIndustry", text(&self.company_industry)),
            ("role", text(&self.role)),
            ("package", Cell::Number(self.package)),
            ("offerDate", text(&self.offer_date)),
            ("status", text(self.status.label())),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighPackageRow {
    pub student_id: String,
    pub student_name: String,
    pub roll_number: String,
    pub branch: String,
    pub batch: String,
    pub company_name: String,
    pub role: String,
    pub package: f64,
    pub offer_date: String,
    pub status: OfferStatus,
}

impl ReportRecord for HighPackageRow {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("studentId", text(&self.student_id)),
            ("studentName", text(&self.student_name)),
            ("rollNumber", text(&self.roll_number)),
            ("branch", text(&self.branch)),
            ("batch", text(&self.batch)),
            ("companyName", text(&self.company_name)),
            ("role", text(&self.role)),
            ("package", Cell::Number(self.package)),
            ("offerDate", text(&self.offer_date)),
            ("status", text(self.status.label())),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRow {
    pub branch: String,
    pub total_students: usize,
    pub placed: usize,
    #[serde(serialize_with = "serialize_fixed2")]
    pub placement_rate: Option<f64>,
    #[serde(serialize_with = "serialize_fixed2")]
    pub avg_package: Option<f64>,
    pub highest_package: f64,
    pub lowest_package: f64,
}

impl ReportRecord for BranchRow {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("branch", text(&self.branch)),
            ("totalStudents", Cell::Count(self.total_students)),
            ("placed", Cell::Count(self.placed)),
            ("placementRate", fixed2(self.placement_rate)),
            ("avgPackage", fixed2(self.avg_package)),
            ("highestPackage", Cell::Number(self.highest_package)),
            ("lowestPackage", Cell::Number(self.lowest_package)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRow {
    pub batch: String,
    pub total_students: usize,
    pub placed: usize,
    #[serde(serialize_with = "serialize_fixed2")]
    pub placement_rate: Option<f64>,
    #[serde(serialize_with = "serialize_fixed2")]
    pub avg_package: Option<f64>,
    pub highest_package: f64,
}

impl ReportRecord for BatchRow {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("batch", text(&self.batch)),
            ("totalStudents", Cell::Count(self.total_students)),
            ("placed", Cell::Count(self.placed)),
            ("placementRate", fixed2(self.placement_rate)),
            ("avgPackage", fixed2(self.avg_package)),
            ("highestPackage", Cell::Number(self.highest_package)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRow {
    pub company_name: String,
    pub industry: String,
    pub offers_extended: usize,
    pub offers_accepted: usize,
    pub offers_pending: usize,
    pub offers_declined: usize,
    #[serde(serialize_with = "serialize_fixed2")]
    pub avg_package: Option<f64>,
    pub highest_package: f64,
    pub lowest_package: f64,
}

impl ReportRecord for CompanyRow {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("companyName", text(&self.company_name)),
            ("industry", text(&self.industry)),
            ("offersExtended", Cell::Count(self.offers_extended)),
            ("offersAccepted", Cell::Count(self.offers_accepted)),
            ("offersPending", Cell::Count(self.offers_pending)),
            ("offersDeclined", Cell::Count(self.offers_declined)),
            ("avgPackage", fixed2(self.avg_package)),
            ("highestPackage", Cell::Number(self.highest_package)),
            ("lowestPackage", Cell::Number(self.lowest_package)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPerformanceRow {
    pub student_id: String,
    pub student_name: String,
    pub roll_number: String,
    pub branch: String,
    pub batch: String,
    pub offers_received: usize,
    pub highest_package: f64,
    pub accepted_package: f64,
    pub accepted_company: String,
    pub status: PlacementOutcome,
}

impl ReportRecord for StudentPerformanceRow {
    fn cells(&self) -> Vec<(&'static str, Cell)> {
        vec![
            ("studentId", text(&self.student_id)),
            ("studentName", text(&self.student_name)),
            ("rollNumber", text(&self.roll_number)),
            ("branch", text(&self.branch)),
            ("batch", text(&self.batch)),
            ("offersReceived", Cell::Count(self.offers_received)),
            ("highestPackage", Cell::Number(self.highest_package)),
            ("acceptedPackage", Cell::Number(self.accepted_package)),
            ("acceptedCompany", text(&self.accepted_company)),
            ("status", text(self.status.label())),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCompany {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchStats {
    pub branch: String,
    pub total_students: usize,
    pub placed_students: usize,
    #[serde(serialize_with = "serialize_fixed2")]
    pub placement_rate: Option<f64>,
    /// Mean of each placed student's best accepted package.
    #[serde(serialize_with = "serialize_fixed2")]
    pub avg_package: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_students: usize,
    pub placed_students: usize,
    #[serde(serialize_with = "serialize_fixed2")]
    pub placement_rate: Option<f64>,
    /// Mean over every accepted offer.
    #[serde(serialize_with = "serialize_fixed2")]
    pub avg_package: Option<f64>,
    pub top_company: TopCompany,
    pub highest_package: f64,
    pub branch_stats: Vec<BranchStats>,
}
