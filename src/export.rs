use chrono::{NaiveDate, NaiveTime};
use rust_xlsxwriter::{Format, Workbook};
use unicode_width::UnicodeWidthStr;

use crate::errors::AppError;
use crate::structs::PeriodWithEntries;

pub const REPORT_FILENAME: &str = "overtime_report.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADERS: [&str; 5] = ["Date", "Start Time", "End Time", "Entry Time", "Exit Time"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub entry_time: NaiveTime,
    pub exit_time: NaiveTime,
}

impl ReportRow {
    fn cells(&self) -> [String; 5] {
        [
            self.date.format("%Y-%m-%d").to_string(),
            self.start_time.format("%H:%M").to_string(),
            self.end_time.format("%H:%M").to_string(),
            self.entry_time.format("%H:%M").to_string(),
            self.exit_time.format("%H:%M").to_string(),
        ]
    }
}

/// One row per (period, entry) pair, repeating the period's date and span
/// next to each entry. A period without entries contributes no rows.
pub fn flatten_report(periods: &[PeriodWithEntries]) -> Vec<ReportRow> {
    let mut rows = Vec::new();
    for item in periods {
        for entry in &item.entries {
            rows.push(ReportRow {
                date: item.period.date,
                start_time: item.period.start_time,
                end_time: item.period.end_time,
                entry_time: entry.entry_time,
                exit_time: entry.exit_time,
            });
        }
    }
    rows
}

/// Build the report workbook in memory so the web layer can stream it.
pub fn build_workbook(rows: &[ReportRow]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let header_format = Format::new().set_bold();
    let mut col_widths: Vec<usize> = HEADERS.iter().map(|h| UnicodeWidthStr::width(*h)).collect();

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_with_format(0, col as u16, *header, &header_format)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (row_index, row) in rows.iter().enumerate() {
        for (col, value) in row.cells().iter().enumerate() {
            worksheet.write((row_index + 1) as u32, col as u16, value.as_str())?;
            col_widths[col] = col_widths[col].max(UnicodeWidthStr::width(value.as_str()));
        }
    }

    for (col, width) in col_widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width as f64 + 2.0)?;
    }

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{OvertimePeriod, WorkEntry};

    fn period(id: i64, date: &str, start: &str, end: &str) -> OvertimePeriod {
        OvertimePeriod {
            id,
            user_id: 1,
            date: date.parse().unwrap(),
            start_time: crate::utils::parse_time(start).unwrap(),
            end_time: crate::utils::parse_time(end).unwrap(),
            created_at: String::new(),
        }
    }

    fn entry(id: i64, period_id: i64, entry: &str, exit: &str) -> WorkEntry {
        WorkEntry {
            id,
            overtime_period_id: period_id,
            entry_time: crate::utils::parse_time(entry).unwrap(),
            exit_time: crate::utils::parse_time(exit).unwrap(),
            created_at: String::new(),
        }
    }

    #[test]
    fn one_row_per_period_entry_pair() {
        let periods = vec![
            PeriodWithEntries {
                period: period(1, "2024-01-01", "22:00", "06:00"),
                entries: vec![entry(1, 1, "23:00", "23:30"), entry(2, 1, "01:00", "02:15")],
            },
            PeriodWithEntries {
                period: period(2, "2024-02-10", "20:00", "23:00"),
                entries: vec![],
            },
        ];

        let rows = flatten_report(&periods);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.date == "2024-01-01".parse().unwrap()));
        assert_eq!(
            rows[0].cells(),
            ["2024-01-01", "22:00", "06:00", "23:00", "23:30"]
        );
        assert_eq!(
            rows[1].cells(),
            ["2024-01-01", "22:00", "06:00", "01:00", "02:15"]
        );
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(flatten_report(&[]).is_empty());
    }

    #[test]
    fn workbook_bytes_are_a_zip_archive() {
        let rows = flatten_report(&[PeriodWithEntries {
            period: period(1, "2024-01-01", "22:00", "06:00"),
            entries: vec![entry(1, 1, "23:00", "23:30")],
        }]);
        let buffer = build_workbook(&rows).unwrap();
        assert!(buffer.starts_with(b"PK"));
    }

    #[test]
    fn workbook_without_rows_still_builds() {
        let buffer = build_workbook(&[]).unwrap();
        assert!(buffer.starts_with(b"PK"));
    }
}
