//! Follow-up scanner: turns raw sheet rows into today's follow-ups.
//!
//! Rows arrive as ragged `Vec<String>` straight from the Sheets values
//! endpoint. Each row is converted to a named [`LeadRow`] at the boundary so
//! column positions live in exactly one place, then matched against today's
//! date. Every row gets an explicit [`RowOutcome`] rather than being silently
//! dropped on a parse failure.

use chrono::NaiveDate;

/// Date format leads are expected to use in the follow-up column.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A sheet row with the columns the scanner cares about pulled out by name.
#[derive(Clone, Debug)]
pub struct LeadRow {
    pub name: String,
    pub company: String,
    pub phone: String,
    pub email: String,
    pub follow_up_date: String,
    pub next_action: String,
}

impl LeadRow {
    /// Build a `LeadRow` from a raw values row, treating missing trailing
    /// cells as empty strings.
    pub fn from_raw(raw: &[String]) -> Self {
        let field = |i: usize| raw.get(i).cloned().unwrap_or_default();
        Self {
            name: field(0),
            company: field(1),
            phone: field(3),
            email: field(4),
            follow_up_date: field(8),
            next_action: field(11),
        }
    }
}

/// A lead due for follow-up today.
#[derive(Clone, Debug, PartialEq)]
pub struct FollowUp {
    pub name: String,
    pub company: String,
    pub phone: String,
    pub email: String,
    pub next_action: String,
}

/// Half-open sheet row interval to highlight, in sheet coordinates
/// (data row 0 is sheet row 1 because of the header).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Highlight {
    pub start_row: i64,
    pub end_row: i64,
}

/// Why a row was excluded from date matching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    EmptyDate,
    UnparsableDate(String),
}

/// Per-row scan result.
#[derive(Clone, Debug, PartialEq)]
pub enum RowOutcome {
    Matched,
    NotDue(NaiveDate),
    Skipped(SkipReason),
}

/// Everything a single scan produced: the matched leads, the highlight
/// ranges for them, and one outcome per input row.
#[derive(Clone, Debug, Default)]
pub struct ScanReport {
    pub follow_ups: Vec<FollowUp>,
    pub highlights: Vec<Highlight>,
    pub outcomes: Vec<RowOutcome>,
}

impl ScanReport {
    /// Number of rows skipped for missing or malformed dates.
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Skipped(_)))
            .count()
    }

    /// Human-readable summary of today's follow-ups.
    pub fn summary(&self) -> String {
        if self.follow_ups.is_empty() {
            return "✅ No leads scheduled for follow-up today.".to_string();
        }
        let mut text = format!(
            "📌 You have {} leads to follow up today:\n",
            self.follow_ups.len()
        );
        for lead in &self.follow_ups {
            text.push_str(&format!(
                "\n🔹 {} ({})\n    📞 {} | ✉️ {}\n    📋 Next Action: {}\n",
                lead.name, lead.company, lead.phone, lead.email, lead.next_action
            ));
        }
        text.trim().to_string()
    }
}

/// Scan raw sheet rows for leads whose follow-up date is `today`.
pub fn scan(rows: &[Vec<String>], today: NaiveDate) -> ScanReport {
    let mut report = ScanReport::default();
    for (idx, raw) in rows.iter().enumerate() {
        let lead = LeadRow::from_raw(raw);

        let date_text = lead.follow_up_date.trim();
        if date_text.is_empty() {
            report.outcomes.push(RowOutcome::Skipped(SkipReason::EmptyDate));
            continue;
        }
        let due = match NaiveDate::parse_from_str(date_text, DATE_FORMAT) {
            Ok(date) => date,
            Err(_) => {
                report.outcomes.push(RowOutcome::Skipped(
                    SkipReason::UnparsableDate(date_text.to_string()),
                ));
                continue;
            }
        };
        if due != today {
            report.outcomes.push(RowOutcome::NotDue(due));
            continue;
        }

        report.follow_ups.push(FollowUp {
            name: lead.name,
            company: lead.company,
            phone: lead.phone,
            email: lead.email,
            next_action: lead.next_action,
        });
        // Data row `idx` sits below the header, so sheet row idx + 1.
        report.highlights.push(Highlight {
            start_row: idx as i64 + 1,
            end_row: idx as i64 + 2,
        });
        report.outcomes.push(RowOutcome::Matched);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn full_row(
        name: &str,
        company: &str,
        phone: &str,
        email: &str,
        due: &str,
        action: &str,
    ) -> Vec<String> {
        let mut cells = vec![String::new(); 12];
        cells[0] = name.to_string();
        cells[1] = company.to_string();
        cells[3] = phone.to_string();
        cells[4] = email.to_string();
        cells[8] = due.to_string();
        cells[11] = action.to_string();
        cells
    }

    #[test]
    fn matches_today_and_builds_highlight() {
        let rows = vec![full_row(
            "Alice",
            "Acme",
            "555",
            "a@x.com",
            "2024-06-01",
            "Call back",
        )];
        let report = scan(&rows, date(2024, 6, 1));

        assert_eq!(report.follow_ups.len(), 1);
        assert_eq!(report.follow_ups[0].name, "Alice");
        assert_eq!(report.follow_ups[0].next_action, "Call back");
        assert_eq!(
            report.highlights,
            vec![Highlight {
                start_row: 1,
                end_row: 2
            }]
        );
        assert_eq!(report.outcomes, vec![RowOutcome::Matched]);
    }

    #[test]
    fn other_dates_are_not_due() {
        let rows = vec![full_row("Bob", "Beta", "556", "b@x.com", "2024-06-02", "Email")];
        let report = scan(&rows, date(2024, 6, 1));

        assert!(report.follow_ups.is_empty());
        assert!(report.highlights.is_empty());
        assert_eq!(report.outcomes, vec![RowOutcome::NotDue(date(2024, 6, 2))]);
    }

    #[test]
    fn short_rows_read_as_trailing_empties() {
        // Row ends right after the date column; the action cell is absent.
        let rows = vec![row(&[
            "Cara", "Gamma", "", "557", "c@x.com", "", "", "", "2024-06-01",
        ])];
        let report = scan(&rows, date(2024, 6, 1));

        assert_eq!(report.follow_ups.len(), 1);
        assert_eq!(report.follow_ups[0].next_action, "");
    }

    #[test]
    fn malformed_dates_skip_with_reason() {
        let rows = vec![
            full_row("Dan", "Delta", "558", "d@x.com", "06/01/2024", "Call"),
            full_row("Eve", "Echo", "559", "e@x.com", "tomorrow", "Call"),
        ];
        let report = scan(&rows, date(2024, 6, 1));

        assert!(report.follow_ups.is_empty());
        assert_eq!(
            report.outcomes,
            vec![
                RowOutcome::Skipped(SkipReason::UnparsableDate("06/01/2024".to_string())),
                RowOutcome::Skipped(SkipReason::UnparsableDate("tomorrow".to_string())),
            ]
        );
        assert_eq!(report.skipped(), 2);
    }

    #[test]
    fn empty_dates_skip_without_text() {
        let rows = vec![full_row("Fay", "Fox", "560", "f@x.com", "", "Call")];
        let report = scan(&rows, date(2024, 6, 1));

        assert_eq!(
            report.outcomes,
            vec![RowOutcome::Skipped(SkipReason::EmptyDate)]
        );
    }

    #[test]
    fn whitespace_around_the_date_is_ignored() {
        let rows = vec![full_row("Gil", "Grid", "561", "g@x.com", "  2024-06-01 ", "Ping")];
        let report = scan(&rows, date(2024, 6, 1));

        assert_eq!(report.follow_ups.len(), 1);
    }

    #[test]
    fn duplicates_match_independently_in_row_order() {
        let rows = vec![
            full_row("Ann", "A", "1", "a@x.com", "2024-06-01", "Call"),
            full_row("Ben", "B", "2", "b@x.com", "2024-06-03", "Wait"),
            full_row("Ann", "A", "1", "a@x.com", "2024-06-01", "Call"),
        ];
        let report = scan(&rows, date(2024, 6, 1));

        assert_eq!(report.follow_ups.len(), 2);
        assert_eq!(
            report.highlights,
            vec![
                Highlight {
                    start_row: 1,
                    end_row: 2
                },
                Highlight {
                    start_row: 3,
                    end_row: 4
                },
            ]
        );
    }

    #[test]
    fn empty_input_yields_no_leads() {
        let report = scan(&[], date(2024, 6, 1));

        assert!(report.follow_ups.is_empty());
        assert!(report.outcomes.is_empty());
        assert_eq!(report.summary(), "✅ No leads scheduled for follow-up today.");
    }

    #[test]
    fn summary_lists_each_lead_block() {
        let rows = vec![full_row(
            "Alice",
            "Acme",
            "555",
            "a@x.com",
            "2024-06-01",
            "Call back",
        )];
        let report = scan(&rows, date(2024, 6, 1));
        let summary = report.summary();

        assert!(summary.starts_with("📌 You have 1 leads to follow up today:"));
        assert!(summary.contains("🔹 Alice (Acme)"));
        assert!(summary.contains("📞 555 | ✉️ a@x.com"));
        assert!(summary.contains("📋 Next Action: Call back"));
        assert!(!summary.ends_with('\n'));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let mut cells = full_row("Hal", "Hub", "562", "h@x.com", "2024-06-01", "Demo");
        cells.push("overflow".to_string());
        cells.push("more".to_string());
        let report = scan(&[cells], date(2024, 6, 1));

        assert_eq!(report.follow_ups.len(), 1);
        assert_eq!(report.follow_ups[0].next_action, "Demo");
    }
}
