//! Human-readable rendering of engine results.

use court_records::{CaseRecord, RateLimitReport, RateLimitState, RefreshReport};

pub const NOT_FOUND: &str = "no matching case";

fn date_or_unknown(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string())
        .unwrap_or_else(|| court_records::UNKNOWN.to_string())
}

/// One line per case, for search result lists.
pub fn case_line(record: &CaseRecord) -> String {
    format!(
        "{}  {}  [{}]  filed {}",
        record.case_number,
        record.case_title,
        record.status,
        date_or_unknown(record.date_filed)
    )
}

/// Full multi-line view of one case.
pub fn case_details(record: &CaseRecord) -> String {
    let mut out = format!("{}  {}\n", record.case_number, record.case_title);
    out.push_str(&format!("  Type:        {}\n", record.case_type));
    out.push_str(&format!("  Status:      {}\n", record.status));
    out.push_str(&format!("  Filed:       {}\n", date_or_unknown(record.date_filed)));
    out.push_str(&format!("  Department:  {}\n", record.department));
    out.push_str(&format!("  Judge:       {}\n", record.judge));
    if !record.parties.is_empty() {
        out.push_str(&format!("  Parties:     {}\n", record.parties.join(" / ")));
    }
    out.push_str(&format!(
        "  Last activity: {}\n",
        date_or_unknown(record.last_activity)
    ));

    if !record.register_of_actions.is_empty() {
        out.push_str("\nRegister of actions:\n");
        for entry in &record.register_of_actions {
            out.push_str(&format!("  {}  {}", date_or_unknown(entry.date), entry.action));
            if !entry.description.is_empty() {
                out.push_str(&format!(": {}", entry.description));
            }
            if !entry.filed_by.is_empty() {
                out.push_str(&format!(" (filed by {})", entry.filed_by));
            }
            out.push('\n');
        }
    }

    if !record.upcoming_events.is_empty() {
        out.push_str("\nUpcoming events:\n");
        for event in &record.upcoming_events {
            out.push_str(&format!(
                "  {} {}  {}",
                date_or_unknown(event.date),
                event.time,
                event.event_type
            ));
            if !event.department.is_empty() {
                out.push_str(&format!("  Dept {}", event.department));
            }
            out.push('\n');
        }
    }

    if let Some(upgrade) = &record.upgrade_options {
        out.push_str(&format!(
            "\nWithheld by source: {}\n",
            upgrade.withheld.join(", ")
        ));
    }
    out.push_str(&format!("\n(source: {})\n", record.source));
    out
}

pub fn refresh_report(report: &RefreshReport) -> String {
    let mut out = format!(
        "Updated {} case(s), {} failed\n",
        report.updated.len(),
        report.failures.len()
    );
    for record in &report.updated {
        out.push_str(&format!("  ok    {}\n", case_line(record)));
    }
    for (number, reason) in &report.failures {
        out.push_str(&format!("  FAIL  {number}: {reason}\n"));
    }
    out
}

fn state_line(state: &RateLimitState) -> String {
    let resets = state
        .resets_in_ms
        .map(|ms| format!("resets in {:.1}s", ms as f64 / 1000.0))
        .unwrap_or_else(|| "idle".to_string());
    format!(
        "{:<12} {}/{} per {}s, {}",
        state.source,
        state.current,
        state.limit,
        state.window_ms / 1000,
        resets
    )
}

pub fn rate_limits(report: &RateLimitReport) -> String {
    match report {
        RateLimitReport::Single(state) => format!("{}\n", state_line(state)),
        RateLimitReport::All(all) => all
            .values()
            .map(|state| format!("{}\n", state_line(state)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use court_records::{RefreshFailure, UNKNOWN};

    fn record() -> CaseRecord {
        CaseRecord {
            case_number: "22FL001581C".to_string(),
            case_title: "Smith v. Jones".to_string(),
            case_type: UNKNOWN.to_string(),
            status: "Active".to_string(),
            date_filed: chrono::NaiveDate::from_ymd_opt(2022, 2, 10),
            department: "702".to_string(),
            judge: UNKNOWN.to_string(),
            parties: vec!["Smith".to_string(), "Jones".to_string()],
            register_of_actions: vec![],
            upcoming_events: vec![],
            last_activity: None,
            upgrade_options: None,
            source: "case_index".to_string(),
        }
    }

    #[test]
    fn test_case_line() {
        assert_eq!(
            case_line(&record()),
            "22FL001581C  Smith v. Jones  [Active]  filed 2022-02-10"
        );
    }

    #[test]
    fn test_case_details_shows_unknowns() {
        let text = case_details(&record());
        assert!(text.contains("Judge:       Unknown"));
        assert!(text.contains("Parties:     Smith / Jones"));
        assert!(text.contains("Last activity: Unknown"));
        assert!(!text.contains("Register of actions"));
    }

    #[test]
    fn test_case_details_lists_actions_and_withheld() {
        let mut record = record();
        record.register_of_actions.push(court_records::ActionEntry {
            date: chrono::NaiveDate::from_ymd_opt(2022, 2, 10),
            action: "Petition Filed".to_string(),
            description: String::new(),
            filed_by: "Smith".to_string(),
        });
        record.upgrade_options = Some(court_records::UpgradeOptions {
            withheld: vec!["documents".to_string()],
        });
        let text = case_details(&record);
        assert!(text.contains("\nRegister of actions:\n  2022-02-10  Petition Filed (filed by Smith)\n"));
        assert!(text.contains("\nWithheld by source: documents\n"));
        assert!(text.ends_with("(source: case_index)\n"));
    }

    #[test]
    fn test_refresh_report_lists_failures() {
        let mut report = RefreshReport::default();
        report.updated.push(record());
        report
            .failures
            .insert("B200".to_string(), RefreshFailure::NotFound);
        let text = refresh_report(&report);
        assert!(text.starts_with("Updated 1 case(s), 1 failed"));
        assert!(text.contains("FAIL  B200: no matching case"));
    }

    #[test]
    fn test_idle_rate_limit() {
        let state = RateLimitState {
            source: "roasearch".to_string(),
            current: 0,
            limit: 20,
            window_ms: 60_000,
            resets_in_ms: None,
        };
        assert_eq!(
            rate_limits(&RateLimitReport::Single(state)),
            "roasearch    0/20 per 60s, idle\n"
        );
    }
}
