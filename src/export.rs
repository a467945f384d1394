use std::fmt::Write;

use chrono::{DateTime, Local, NaiveDate};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::ExportError;
use crate::filters::{ReportFilters, ALL};
use crate::models::{Cell, PlacementRow};
use crate::report::{Report, ReportRows};

const COLLEGE_NAME: &str = "SRI VENKATESWARA INSTITUTE OF TECHNOLOGY";
const COLLEGE_ADDRESS: &str = "Andhra Pradesh, South India";
const FOOTER: &str = "Report generated by SVIT Placement Management System";

const CUSTOM_COLUMNS: [&str; 8] = [
    "Roll Number",
    "Student Name",
    "Branch",
    "Batch",
    "Company",
    "Role",
    "Package (LPA)",
    "Status",
];

/// Serializes a report as CSV: the first row's keys, then one line per row.
///
/// Values are written verbatim. Commas inside a value are not quoted, so such a
/// value spills into the next column.
pub fn to_csv(report: &Report) -> Result<String, ExportError> {
    let records = report.rows.records();
    let Some(first) = records.first() else {
        return Err(ExportError::Empty);
    };

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(first.iter().map(|(key, _)| *key))?;
    for record in &records {
        writer.write_record(record.iter().map(|(_, cell)| cell.to_string()))?;
    }

    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    let mut output = String::from_utf8(bytes)?;
    if output.ends_with('\n') {
        output.pop();
    }
    Ok(output)
}

/// `Branch-wise Placement Statistics` on 2024-03-01 becomes
/// `branch-wise_placement_statistics_2024-03-01.csv`.
pub fn csv_file_name(title: &str, date: NaiveDate) -> String {
    let stem = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    format!("{stem}_{}.csv", date.format("%Y-%m-%d"))
}

/// Plain markdown rendering for terminal output.
pub fn to_markdown(report: &Report) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {}", report.title);
    let _ = writeln!(output);

    let records = report.rows.records();
    let Some(first) = records.first() else {
        let _ = writeln!(output, "No data found.");
        return output;
    };

    let headers: Vec<&str> = first.iter().map(|(key, _)| *key).collect();
    let _ = writeln!(output, "| {} |", headers.join(" | "));
    let _ = writeln!(output, "|{}", "---|".repeat(headers.len()));
    for record in &records {
        let values: Vec<String> = record.iter().map(|(_, cell)| cell.to_string()).collect();
        let _ = writeln!(output, "| {} |", values.join(" | "));
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Total records: {}", records.len());
    output
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintLayout {
    /// Fixed eight columns for filtered placement rows.
    Custom,
    /// Columns inferred from the row keys.
    Predefined,
}

#[derive(Debug, Clone)]
pub struct PrintOptions {
    pub academic_year: String,
    pub generated_at: DateTime<Local>,
}

pub fn render_print(
    report: &Report,
    layout: PrintLayout,
    filters: &ReportFilters,
    options: &PrintOptions,
) -> Result<String, ExportError> {
    if report.rows.is_empty() {
        return Err(ExportError::Empty);
    }

    let (headers, body) = match (layout, &report.rows) {
        (PrintLayout::Custom, ReportRows::Placement(rows)) => custom_table(rows),
        _ => inferred_table(report),
    };

    let title = escape_html(&report.title);
    let mut output = String::new();
    let _ = writeln!(output, "<html>");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "<title>{title} - SVIT College</title>");
    let _ = writeln!(output, "<style>{STYLE}</style>");
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
    let _ = writeln!(output, "<div class=\"college-header\">");
    let _ = writeln!(output, "<p class=\"college-name\">{COLLEGE_NAME}</p>");
    let _ = writeln!(output, "<p class=\"college-address\">{COLLEGE_ADDRESS}</p>");
    let _ = writeln!(output, "</div>");
    let _ = writeln!(output, "<h1>{title}</h1>");
    let _ = writeln!(output, "<div class=\"report-info\">");
    info_line(
        &mut output,
        "Generated on",
        &options.generated_at.format("%d/%m/%Y, %H:%M:%S").to_string(),
    );
    info_line(&mut output, "Academic Year", &options.academic_year);
    info_line(&mut output, "Total Records", &report.rows.len().to_string());
    if layout == PrintLayout::Custom {
        info_line(&mut output, "Branch", filters.branch.as_deref().unwrap_or(ALL));
        info_line(&mut output, "Batch", filters.batch.as_deref().unwrap_or(ALL));
        info_line(&mut output, "Company", filters.company.as_deref().unwrap_or(ALL));
        info_line(&mut output, "Status", filters.status.as_deref().unwrap_or(ALL));
        if let Some(min) = filters.package_above {
            info_line(&mut output, "Package Above", &format!("{min} LPA"));
        }
        if let Some(max) = filters.package_below {
            info_line(&mut output, "Package Below", &format!("{max} LPA"));
        }
    }
    let _ = writeln!(output, "</div>");
    let _ = writeln!(output, "<table>");
    let _ = writeln!(output, "<thead>{headers}</thead>");
    let _ = writeln!(output, "<tbody>{body}</tbody>");
    let _ = writeln!(output, "</table>");
    let _ = writeln!(output, "<div class=\"print-date\"><p>{FOOTER}</p></div>");
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");
    Ok(output)
}

fn info_line(output: &mut String, label: &str, value: &str) {
    let _ = writeln!(
        output,
        "<p><strong>{label}:</strong> {}</p>",
        escape_html(value)
    );
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

fn custom_table(rows: &[PlacementRow]) -> (String, String) {
    let headers = format!("<tr>{}</tr>", header_cells(CUSTOM_COLUMNS));
    let mut body = String::new();
    for row in rows {
        let cells = [
            escape_html(or_na(&row.roll_number)),
            escape_html(or_na(&row.student_name)),
            escape_html(or_na(&row.branch)),
            escape_html(or_na(&row.batch)),
            escape_html(or_na(&row.company_name)),
            escape_html(or_na(&row.role)),
            format!("{:.1}", row.package),
            escape_html(row.status.label()),
        ];
        let _ = write!(body, "<tr>");
        for cell in cells {
            let _ = write!(body, "<td>{cell}</td>");
        }
        let _ = write!(body, "</tr>");
    }
    (headers, body)
}

fn inferred_table(report: &Report) -> (String, String) {
    let records = report.rows.records();
    let headers = records
        .first()
        .map(|first| {
            let labels: Vec<String> = first.iter().map(|(key, _)| column_label(key)).collect();
            format!("<tr>{}</tr>", header_cells(labels))
        })
        .unwrap_or_default();

    let mut body = String::new();
    for record in &records {
        let _ = write!(body, "<tr>");
        for (key, cell) in record {
            let _ = write!(body, "<td>{}</td>", print_value(key, cell));
        }
        let _ = write!(body, "</tr>");
    }
    (headers, body)
}

fn header_cells<I, S>(labels: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels
        .into_iter()
        .map(|label| format!("<th>{}</th>", escape_html(label.as_ref())))
        .collect()
}

/// `offersExtended` becomes `Offers Extended`.
pub fn column_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    for (index, ch) in key.chars().enumerate() {
        if index == 0 {
            label.extend(ch.to_uppercase());
        } else if ch.is_ascii_uppercase() {
            label.push(' ');
            label.push(ch);
        } else {
            label.push(ch);
        }
    }
    label
}

/// Package and rate figures print with one decimal; rates carry a `%`.
pub fn print_value(key: &str, cell: &Cell) -> String {
    let key = key.to_ascii_lowercase();
    let is_rate = key.contains("rate");
    match cell.as_number() {
        Some(value) if is_rate => format!("{value:.1}%"),
        Some(value) if key.contains("package") => format!("{value:.1}"),
        _ => escape_html(&cell.to_string()),
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const STYLE: &str = "\
body { font-family: 'Arial', sans-serif; margin: 20px; }
h1 { text-align: center; color: #2c3e50; margin-bottom: 20px; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { border: 1px solid #ddd; padding: 10px; text-align: left; }
th { background-color: #3498db; color: white; font-weight: bold; }
tr:nth-child(even) { background-color: #f8f9fa; }
.report-info { margin-bottom: 20px; border: 1px solid #eee; padding: 15px; background-color: #f8f9fa; border-radius: 5px; }
.report-info p { margin: 5px 0; }
.print-date { text-align: right; font-size: 0.8em; color: #7f8c8d; margin-top: 10px; }
.college-header { text-align: center; margin-bottom: 20px; }
.college-name { font-size: 22px; font-weight: bold; margin: 0; color: #2c3e50; }
.college-address { font-size: 14px; margin: 5px 0; color: #7f8c8d; }
@media print {
  body { margin: 0.5cm; }
  table, th, td { font-size: 10pt; }
  th { -webkit-print-color-adjust: exact; print-color-adjust: exact; }
}";
