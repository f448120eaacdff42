//! Markdown report rendering

use chrono::{DateTime, NaiveDate, Utc};

use crate::breakdown::BreakdownRow;

/// Aggregated results for one event source.
#[derive(Debug, Clone)]
pub struct SourceSection {
    pub source_name: String,
    pub total_events: usize,
    pub distinct_users: usize,
    pub reasons: Vec<BreakdownRow>,
    pub merchants: Vec<BreakdownRow>,
}

/// Submission activity for one form. `entry_count` is `None` when the
/// upstream fetch for that form failed; the report shows the gap instead of
/// silently dropping the row.
#[derive(Debug, Clone)]
pub struct FormSection {
    pub form_id: u64,
    pub title: String,
    pub entry_count: Option<usize>,
}

/// Render the full Markdown report.
pub fn render_report(
    generated_at: DateTime<Utc>,
    start: NaiveDate,
    end: NaiveDate,
    sources: &[SourceSection],
    forms: &[FormSection],
) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Payment report {} to {}\n\n", start, end));
    out.push_str(&format!(
        "Generated {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    for section in sources {
        out.push_str(&format!("## {}\n\n", section.source_name));
        out.push_str(&format!(
            "{} events from {} distinct users\n\n",
            section.total_events, section.distinct_users
        ));

        if !section.reasons.is_empty() {
            out.push_str("### By reason\n\n");
            push_breakdown_table(&mut out, "Reason", &section.reasons);
        }
        if !section.merchants.is_empty() {
            out.push_str("### By merchant\n\n");
            push_breakdown_table(&mut out, "Merchant", &section.merchants);
        }
    }

    if !forms.is_empty() {
        out.push_str("## Form submissions\n\n");
        out.push_str("| Form | Entries |\n|---|---|\n");
        for form in forms {
            match form.entry_count {
                Some(count) => {
                    out.push_str(&format!("| {} | {} |\n", form.title, count));
                }
                None => {
                    out.push_str(&format!("| {} | fetch failed |\n", form.title));
                }
            }
        }
        out.push('\n');
    }

    out
}

fn push_breakdown_table(out: &mut String, key_header: &str, rows: &[BreakdownRow]) {
    out.push_str(&format!("| {} | Events | Users |\n|---|---|---|\n", key_header));
    for row in rows {
        out.push_str(&format!("| {} | {} | {} |\n", row.label, row.events, row.users));
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_render_includes_sections_and_tables() {
        let sources = vec![SourceSection {
            source_name: "Card Declines".to_string(),
            total_events: 3,
            distinct_users: 2,
            reasons: vec![
                BreakdownRow {
                    label: "Invalid card number".to_string(),
                    events: 2,
                    users: 2,
                },
                BreakdownRow {
                    label: "Insufficient Funds".to_string(),
                    events: 1,
                    users: 1,
                },
            ],
            merchants: vec![],
        }];
        let forms = vec![
            FormSection {
                form_id: 7,
                title: "Contact".to_string(),
                entry_count: Some(42),
            },
            FormSection {
                form_id: 9,
                title: "Signup".to_string(),
                entry_count: None,
            },
        ];

        let report = render_report(
            Utc.with_ymd_and_hms(2025, 10, 10, 9, 0, 0).unwrap(),
            date(2025, 9, 9),
            date(2025, 10, 9),
            &sources,
            &forms,
        );

        assert!(report.contains("# Payment report 2025-09-09 to 2025-10-09"));
        assert!(report.contains("## Card Declines"));
        assert!(report.contains("3 events from 2 distinct users"));
        assert!(report.contains("| Invalid card number | 2 | 2 |"));
        assert!(report.contains("| Contact | 42 |"));
        assert!(report.contains("| Signup | fetch failed |"));
    }

    #[test]
    fn test_render_without_forms_omits_form_section() {
        let report = render_report(
            Utc.with_ymd_and_hms(2025, 10, 10, 9, 0, 0).unwrap(),
            date(2025, 9, 9),
            date(2025, 10, 9),
            &[],
            &[],
        );
        assert!(!report.contains("## Form submissions"));
    }
}
