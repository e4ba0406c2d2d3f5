//! Map loosely-typed extractor output onto the canonical `CaseRecord`.
//!
//! Nothing here throws for a missing optional field: absent strings become
//! `"Unknown"`, absent dates become `None`. The case number is the only
//! mandatory value, and a case-number query can supply it when the page
//! itself does not print one.

use std::cmp::Ordering;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::extract::{field, RawFields, RawParty};
use crate::types::{
    ActionEntry, CaseQuery, CaseRecord, CourtError, CourtResult, EventEntry, QueryKind,
    UpgradeOptions, UNKNOWN,
};

/// Uppercase a case number and strip the separators sources disagree on.
pub fn canonical_case_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Find the first date-like substring and parse it.
///
/// Accepts `M/D/YYYY`, `M/D/YY` and ISO `YYYY-MM-DD` (with or without a
/// trailing time part). Two-digit years above 69 are 19xx, the rest 20xx.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = date_re().captures(text)?;
    if let (Some(y), Some(m), Some(d)) = (caps.name("iy"), caps.name("im"), caps.name("id")) {
        return NaiveDate::from_ymd_opt(
            y.as_str().parse().ok()?,
            m.as_str().parse().ok()?,
            d.as_str().parse().ok()?,
        );
    }
    let month: u32 = caps.name("um")?.as_str().parse().ok()?;
    let day: u32 = caps.name("ud")?.as_str().parse().ok()?;
    let year_text = caps.name("uy")?.as_str();
    let mut year: i32 = year_text.parse().ok()?;
    if year_text.len() == 2 {
        year += if year > 69 { 1900 } else { 2000 };
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Split a case title into its two sides.
///
/// Handles `A v. B`, `A vs B`, `A versus B` and `In re Marriage of A and B`.
/// Returns an empty list when the title names no opposing parties.
pub fn split_parties(title: &str) -> Vec<String> {
    if let Some(caps) = in_re_re().captures(title.trim()) {
        return [caps.get(1), caps.get(2)]
            .into_iter()
            .flatten()
            .map(|m| clean_party(m.as_str()))
            .filter(|p| !p.is_empty())
            .collect();
    }

    let parts: Vec<String> = versus_re()
        .splitn(title.trim(), 2)
        .map(clean_party)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() == 2 {
        parts
    } else {
        Vec::new()
    }
}

fn clean_party(name: &str) -> String {
    let name = name.trim().trim_end_matches([',', ';', '.']).trim();
    let lower = name.to_lowercase();
    let name = match lower.rfind("et al") {
        Some(idx) if idx > 0 && lower[idx..].trim_end_matches('.').trim() == "et al" => name
            .get(..idx)
            .map(|n| n.trim().trim_end_matches(',').trim())
            .unwrap_or(name),
        _ => name,
    };
    name.to_string()
}

fn party_rank(role: &str) -> u8 {
    match role {
        r if r.starts_with("petitioner") || r.starts_with("plaintiff") => 0,
        r if r.starts_with("respondent") || r.starts_with("defendant") => 1,
        _ => 2,
    }
}

fn ordered_parties(raw: &RawFields, title: Option<&str>) -> Vec<String> {
    let has_roles = raw.parties.iter().any(|p| party_rank(&p.role) < 2);
    if has_roles {
        let mut ranked: Vec<&RawParty> = raw.parties.iter().collect();
        ranked.sort_by_key(|p| party_rank(&p.role));
        return ranked.into_iter().map(|p| p.name.clone()).collect();
    }

    let from_title = title.map(split_parties).unwrap_or_default();
    if !from_title.is_empty() {
        return from_title;
    }
    raw.parties.iter().map(|p| p.name.clone()).collect()
}

fn text_or_unknown(raw: &RawFields, key: &str) -> String {
    raw.get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

fn cell(row: &std::collections::BTreeMap<String, String>, key: &str) -> String {
    row.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Dated entries ascending, undated entries last in source order.
fn by_date(a: &Option<NaiveDate>, b: &Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Build a canonical record from one page's fields.
///
/// `source` is the id of the strategy that fetched the page.
pub fn normalize(raw: &RawFields, query: &CaseQuery, source: &str) -> CourtResult<CaseRecord> {
    let case_number = raw
        .get(field::CASE_NUMBER)
        .map(canonical_case_number)
        .filter(|n| !n.is_empty())
        .or_else(|| match query.kind {
            QueryKind::CaseNumber => Some(query.normalized()),
            QueryKind::Name => None,
        })
        .ok_or_else(|| {
            CourtError::Normalization(format!(
                "no case number on page from {source} for query {:?}",
                query.text
            ))
        })?;

    let mut register_of_actions: Vec<ActionEntry> = raw
        .actions
        .iter()
        .map(|row| ActionEntry {
            date: row.get(field::DATE).and_then(|d| parse_date(d)),
            action: cell(row, field::ACTION),
            description: cell(row, field::DESCRIPTION),
            filed_by: cell(row, field::FILED_BY),
        })
        .collect();
    register_of_actions.sort_by(|a, b| by_date(&a.date, &b.date));

    let mut upcoming_events: Vec<EventEntry> = raw
        .events
        .iter()
        .map(|row| {
            let date_cell = cell(row, field::DATE);
            let mut time = cell(row, field::TIME);
            if time.is_empty() {
                time = time_re()
                    .find(&date_cell)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
            }
            EventEntry {
                date: parse_date(&date_cell),
                time,
                event_type: cell(row, field::EVENT_TYPE),
                department: cell(row, field::DEPARTMENT),
                description: cell(row, field::DESCRIPTION),
            }
        })
        .collect();
    upcoming_events.sort_by(|a, b| by_date(&a.date, &b.date));

    let date_filed = raw.get(field::DATE_FILED).and_then(parse_date);
    let last_activity = register_of_actions
        .iter()
        .filter_map(|a| a.date)
        .chain(upcoming_events.iter().filter_map(|e| e.date))
        .max()
        .or(date_filed);

    let upgrade_options = (!raw.withheld.is_empty()).then(|| UpgradeOptions {
        withheld: raw.withheld.clone(),
    });

    Ok(CaseRecord {
        parties: ordered_parties(raw, raw.get(field::CASE_TITLE)),
        case_number,
        case_title: text_or_unknown(raw, field::CASE_TITLE),
        case_type: text_or_unknown(raw, field::CASE_TYPE),
        status: text_or_unknown(raw, field::STATUS),
        date_filed,
        department: text_or_unknown(raw, field::DEPARTMENT),
        judge: text_or_unknown(raw, field::JUDGE),
        register_of_actions,
        upcoming_events,
        last_activity,
        upgrade_options,
        source: source.to_string(),
    })
}

/// Normalize every extracted case for a query.
///
/// For a case-number query only the record matching the queried number is
/// kept, so the result holds at most one record.
pub fn normalize_all(
    raws: &[RawFields],
    query: &CaseQuery,
    source: &str,
) -> CourtResult<Vec<CaseRecord>> {
    let records = raws
        .iter()
        .map(|raw| normalize(raw, query, source))
        .collect::<CourtResult<Vec<_>>>()?;

    match query.kind {
        QueryKind::CaseNumber => {
            let wanted = query.normalized();
            Ok(records
                .into_iter()
                .find(|r| r.case_number == wanted)
                .into_iter()
                .collect())
        }
        QueryKind::Name => Ok(records),
    }
}

// ── Compiled patterns ───────────────────────────────────────────────────────

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:(?P<iy>\d{4})-(?P<im>\d{1,2})-(?P<id>\d{1,2})|(?P<um>\d{1,2})/(?P<ud>\d{1,2})/(?P<uy>\d{4}|\d{2}))",
        )
        .expect("date regex is valid")
    })
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b\d{1,2}:\d{2}(?:\s*[ap]\.?m\.?)?").expect("time regex is valid")
    })
}

fn versus_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+(?:vs?\.?|versus)\s+").expect("versus regex is valid"))
}

fn in_re_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^in\s+re\s+(?:the\s+)?(?:marriage\s+of\s+)?(.+?)\s+and\s+(.+)$")
            .expect("in re regex is valid")
    })
}
