//! Pull labeled fields and tables out of court-portal HTML.
//!
//! Two passes share one parsed document:
//!
//! 1. **Label capture.** The document is flattened to text, one line per
//!    block element, and label-anchored regexes (`Case Title: ...`) run over
//!    it. Flattening first means values wrapped in `<span>`/`<b>` or split
//!    into a neighbouring `<td>` still line up with their label.
//! 2. **Structure walk.** Tables are classified by their header row into
//!    register-of-actions, calendar, party, and search-result tables, and
//!    two-cell `label | value` rows fill any field the first pass missed.
//!
//! The output is deliberately loose (`RawFields`: string maps keyed by
//! canonical column names). Turning it into a `CaseRecord` is the
//! normalizer's job, so markup drift stays contained in this file.
//!
//! A page with no recognizable markers is reported as a failure, never as an
//! empty record, because an empty record reads exactly like "case not found".

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Canonical keys used in `RawFields::fields` and table rows.
pub mod field {
    pub const CASE_NUMBER: &str = "case_number";
    pub const CASE_TITLE: &str = "case_title";
    pub const CASE_TYPE: &str = "case_type";
    pub const STATUS: &str = "status";
    pub const DATE_FILED: &str = "date_filed";
    pub const DEPARTMENT: &str = "department";
    pub const JUDGE: &str = "judge";

    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const ACTION: &str = "action";
    pub const DESCRIPTION: &str = "description";
    pub const FILED_BY: &str = "filed_by";
    pub const EVENT_TYPE: &str = "event_type";
}

/// Label spellings seen upstream for each single-valued field.
const FIELD_LABELS: &[(&str, &[&str])] = &[
    (
        field::CASE_NUMBER,
        &["Case Number", r"Case No\.?", "Case #"],
    ),
    (field::CASE_TITLE, &["Case Title", "Case Name", "Short Title"]),
    (field::CASE_TYPE, &["Case Type", "Case Category"]),
    (field::STATUS, &["Case Status", "Status"]),
    (
        field::DATE_FILED,
        &["Date Filed", "Filing Date", "Filed Date", "File Date"],
    ),
    (field::DEPARTMENT, &["Department", r"Dept\.?", "Courtroom"]),
    (field::JUDGE, &["Judicial Officer", "Judge", "Hearing Officer"]),
];

/// Party role labels, in canonical order.
const PARTY_LABELS: &[&str] = &["Petitioner", "Plaintiff", "Respondent", "Defendant"];

/// Elements whose boundaries become line breaks when flattening.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "caption", "dd", "div", "dl", "dt",
    "fieldset", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th", "thead",
    "tr", "ul",
];

/// Elements whose text is never page content.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// What kind of page a strategy expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// One case: labeled header fields plus action/event tables.
    CaseDetail,
    /// A list of matching cases, one row or link per case.
    SearchResults,
}

/// Why a document yielded nothing usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    NoMarkersFound,
    AmbiguousResultSet,
    EmptyDocument,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureReason::NoMarkersFound => "no-markers-found",
            FailureReason::AmbiguousResultSet => "ambiguous-result-set",
            FailureReason::EmptyDocument => "empty-document",
        };
        f.write_str(s)
    }
}

/// A party name with the role label it appeared under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawParty {
    pub role: String,
    pub name: String,
}

/// Loosely-typed fields for one case, straight from the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFields {
    pub fields: BTreeMap<String, String>,
    pub parties: Vec<RawParty>,
    pub actions: Vec<BTreeMap<String, String>>,
    pub events: Vec<BTreeMap<String, String>>,
    /// Descriptions of content hidden behind an upgrade wall.
    pub withheld: Vec<String>,
}

impl RawFields {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|s| s.as_str())
    }

    fn set_if_absent(&mut self, key: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.fields
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    fn has_markers(&self) -> bool {
        !self.fields.is_empty()
            || !self.parties.is_empty()
            || !self.actions.is_empty()
            || !self.events.is_empty()
    }
}

/// Outcome of extracting one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// One entry per case found (exactly one for a case-detail page).
    Found(Vec<RawFields>),
    /// The page says, in words, that nothing matched.
    NoResults,
    Failed(FailureReason),
}

/// Extract raw fields from an HTML document.
pub fn extract(html: &str, kind: DocumentKind) -> Extraction {
    if html.trim().is_empty() {
        return Extraction::Failed(FailureReason::EmptyDocument);
    }

    let document = Html::parse_document(html);
    let text = flatten_text(&document);
    if text.trim().is_empty() {
        return Extraction::Failed(FailureReason::EmptyDocument);
    }

    match kind {
        DocumentKind::CaseDetail => extract_case_detail(&document, &text),
        DocumentKind::SearchResults => extract_search_results(&document, &text),
    }
}

// ── Case detail pages ───────────────────────────────────────────────────────

fn extract_case_detail(document: &Html, text: &str) -> Extraction {
    let mut distinct: Vec<String> = capture_all(text, field::CASE_NUMBER)
        .into_iter()
        .map(|n| crate::normalize::canonical_case_number(&n))
        .collect();
    distinct.sort();
    distinct.dedup();
    if distinct.len() > 1 {
        tracing::debug!("case detail page lists {} case numbers", distinct.len());
        return Extraction::Failed(FailureReason::AmbiguousResultSet);
    }

    let mut raw = RawFields::default();
    for (key, _) in FIELD_LABELS {
        if let Some(value) = capture_all(text, key).into_iter().next() {
            raw.set_if_absent(key, &value);
        }
    }
    extract_labeled_rows(document, &mut raw);
    extract_labeled_parties(text, &mut raw);

    let tables = selector("table");
    for table in document.select(&tables) {
        if wraps_table(table) {
            continue;
        }
        let (headers, rows) = read_table(table);
        match classify_table(&headers) {
            TableKind::Events => raw.events.extend(rows_with_columns(&headers, &rows, event_column)),
            TableKind::Actions => {
                raw.actions.extend(rows_with_columns(&headers, &rows, action_column))
            }
            TableKind::Parties => extract_party_rows(&headers, &rows, &mut raw),
            TableKind::Results | TableKind::Other => {}
        }
    }

    raw.withheld = extract_withheld(document, text);

    if raw.has_markers() {
        Extraction::Found(vec![raw])
    } else if says_no_results(text) {
        Extraction::NoResults
    } else {
        Extraction::Failed(FailureReason::NoMarkersFound)
    }
}

/// Every non-empty value captured for `key`'s labels, in document order.
fn capture_all(text: &str, key: &str) -> Vec<String> {
    let Some(re) = field_patterns().get(key) else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter(|caps| {
            caps.name("label")
                .is_some_and(|label| opens_label_segment(text, label.start()))
        })
        .filter_map(|caps| caps.name("value"))
        .map(|m| truncate_at_next_label(m.as_str()))
        .filter(|v| !v.is_empty() && !label_line_re().is_match(v))
        .collect()
}

/// A label counts when it starts its line or follows a complete `Label: value`
/// on the same line, so "Related Case Number:" or "Marital Status:" never
/// stand in for the case's own fields.
fn opens_label_segment(text: &str, at: usize) -> bool {
    let line_start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    let prefix = text[line_start..at].trim_start();
    prefix.is_empty() || label_line_re().is_match(prefix)
}

/// Cut a captured value where another `Label:` begins on the same line.
fn truncate_at_next_label(value: &str) -> String {
    let cut = label_anywhere_re()
        .find(value)
        .map(|m| m.start())
        .unwrap_or(value.len());
    value[..cut].trim().trim_end_matches([',', ';']).trim().to_string()
}

/// Two-cell `label | value` rows (`<tr><th>Judge</th><td>...</td></tr>`, `<dt>/<dd>`).
fn extract_labeled_rows(document: &Html, raw: &mut RawFields) {
    let rows = selector("tr");
    for row in document.select(&rows) {
        let texts: Vec<String> = row_cells(row, &["th", "td"]).map(element_text).collect();
        if texts.len() == 2 {
            if let Some(key) = field_for_label(&texts[0]) {
                raw.set_if_absent(key, &texts[1]);
            }
        }
    }

    let terms = selector("dt");
    for term in document.select(&terms) {
        let Some(key) = field_for_label(&element_text(term)) else {
            continue;
        };
        let value = term
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "dd")
            .map(element_text);
        if let Some(value) = value {
            raw.set_if_absent(key, &value);
        }
    }
}

fn field_for_label(label: &str) -> Option<&'static str> {
    let label = label.trim().trim_end_matches(':').trim();
    exact_label_patterns()
        .iter()
        .find(|(_, re)| re.is_match(label))
        .map(|(key, _)| *key)
}

fn extract_labeled_parties(text: &str, raw: &mut RawFields) {
    for caps in party_label_re().captures_iter(text) {
        let (Some(role), Some(name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let name = truncate_at_next_label(name.as_str());
        if name.is_empty() || label_line_re().is_match(&name) {
            continue;
        }
        push_party(raw, role.as_str(), &name);
    }
}

fn extract_party_rows(headers: &[String], rows: &[Vec<String>], raw: &mut RawFields) {
    let name_col = headers
        .iter()
        .position(|h| h.contains("name") || h == "party");
    let role_col = headers
        .iter()
        .position(|h| h.contains("type") || h.contains("role") || h.contains("party type"));
    let Some(name_col) = name_col else {
        return;
    };
    for row in rows {
        let Some(name) = row.get(name_col) else {
            continue;
        };
        let role = role_col
            .and_then(|c| row.get(c))
            .map(|s| s.as_str())
            .unwrap_or("party");
        push_party(raw, role, name);
    }
}

fn push_party(raw: &mut RawFields, role: &str, name: &str) {
    let name = name.trim();
    if name.is_empty() || raw.parties.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
        return;
    }
    raw.parties.push(RawParty {
        role: role.trim().to_lowercase(),
        name: name.to_string(),
    });
}

fn extract_withheld(document: &Html, text: &str) -> Vec<String> {
    let mut withheld: Vec<String> = Vec::new();
    let mut push = |item: String| {
        let item = item.trim().to_string();
        if !item.is_empty() && !withheld.contains(&item) {
            withheld.push(item);
        }
    };

    for caps in upgrade_re().captures_iter(text) {
        if let Some(m) = caps.get(1) {
            push(m.as_str().to_string());
        }
    }

    let gated = selector("[data-premium]");
    for el in document.select(&gated) {
        let label = el
            .value()
            .attr("data-premium")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.to_string())
            .unwrap_or_else(|| element_text(el));
        push(label);
    }

    withheld
}

// ── Search result pages ─────────────────────────────────────────────────────

fn extract_search_results(document: &Html, text: &str) -> Extraction {
    let mut results: Vec<RawFields> = Vec::new();

    let tables = selector("table");
    for table in document.select(&tables) {
        if wraps_table(table) {
            continue;
        }
        let (headers, rows) = read_table(table);
        if classify_table(&headers) != TableKind::Results {
            continue;
        }
        for row in rows {
            let mut raw = RawFields::default();
            for (header, cell) in headers.iter().zip(row.iter()) {
                match result_column(header) {
                    Some("party") => push_party(&mut raw, "party", cell),
                    Some(key) => raw.set_if_absent(key, cell),
                    None => {}
                }
            }
            if raw.get(field::CASE_NUMBER).is_some() {
                results.push(raw);
            }
        }
    }

    if results.is_empty() {
        results = extract_result_links(document);
    }

    // One entry per case; the first listing wins.
    let mut seen = Vec::new();
    results.retain(|raw| {
        let number = raw
            .get(field::CASE_NUMBER)
            .map(crate::normalize::canonical_case_number)
            .unwrap_or_default();
        if seen.contains(&number) {
            false
        } else {
            seen.push(number);
            true
        }
    });

    if !results.is_empty() {
        Extraction::Found(results)
    } else if says_no_results(text) {
        Extraction::NoResults
    } else {
        Extraction::Failed(FailureReason::NoMarkersFound)
    }
}

/// Result sets rendered as bare links to case pages.
fn extract_result_links(document: &Html) -> Vec<RawFields> {
    let links = selector("a[href]");
    let mut results = Vec::new();
    for link in document.select(&links) {
        let label = element_text(link);
        let href = link.value().attr("href").unwrap_or_default();
        let number = if looks_like_case_number(&label) {
            Some(label.clone())
        } else {
            case_param_re()
                .captures(href)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };
        let Some(number) = number else {
            continue;
        };

        let mut raw = RawFields::default();
        raw.set_if_absent(field::CASE_NUMBER, &number);
        if let Some(title) = link.value().attr("title") {
            raw.set_if_absent(field::CASE_TITLE, title);
        } else if !looks_like_case_number(&label) {
            raw.set_if_absent(field::CASE_TITLE, &label);
        }
        results.push(raw);
    }
    results
}

/// Whether `s` has the shape of a case number (`22FL001581C`, `CIVSB2101234`).
pub fn looks_like_case_number(s: &str) -> bool {
    let canonical = crate::normalize::canonical_case_number(s);
    let digits = canonical.chars().filter(|c| c.is_ascii_digit()).count();
    (6..=20).contains(&canonical.len())
        && canonical.chars().all(|c| c.is_ascii_alphanumeric())
        && canonical.chars().any(|c| c.is_ascii_alphabetic())
        && digits >= 4
}

// ── Tables ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableKind {
    Actions,
    Events,
    Parties,
    Results,
    Other,
}

fn classify_table(headers: &[String]) -> TableKind {
    let has = |needle: &str| headers.iter().any(|h| h.contains(needle));
    if has("case number") || has("case no") || has("case #") {
        return TableKind::Results;
    }
    if has("date") && (has("time") || has("hearing") || has("event type")) {
        return TableKind::Events;
    }
    if has("date")
        && (has("action") || has("docket") || has("description") || has("filed by") || has("proceeding"))
    {
        return TableKind::Actions;
    }
    if (has("party") || has("name")) && (has("type") || has("role")) {
        return TableKind::Parties;
    }
    TableKind::Other
}

/// Lower-cased header texts and the text of every data row.
///
/// Only the table's own rows are read; rows of a table nested inside one of
/// its cells belong to that inner table.
fn read_table(table: ElementRef<'_>) -> (Vec<String>, Vec<Vec<String>>) {
    let rows_sel = selector("tr");

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    let own_rows = table
        .select(&rows_sel)
        .filter(|row| nearest_table(*row).is_some_and(|t| t.id() == table.id()));
    for row in own_rows {
        let ths: Vec<String> = row_cells(row, &["th"]).map(element_text).collect();
        let tds: Vec<String> = row_cells(row, &["td"]).map(element_text).collect();
        if headers.is_empty() && !ths.is_empty() && tds.is_empty() {
            headers = ths
                .iter()
                .map(|h| h.trim_end_matches(':').trim().to_lowercase())
                .collect();
            continue;
        }
        if tds.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(tds);
    }

    // Header-less tables use their first row as the header.
    if headers.is_empty() && !rows.is_empty() {
        headers = rows
            .remove(0)
            .iter()
            .map(|h| h.trim_end_matches(':').trim().to_lowercase())
            .collect();
    }
    (headers, rows)
}

/// Cells that are direct children of `row`.
fn row_cells<'a>(
    row: ElementRef<'a>,
    names: &'static [&'static str],
) -> impl Iterator<Item = ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(move |cell| names.contains(&cell.value().name()))
}

fn nearest_table(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
}

/// Layout tables that hold another table are never classified themselves.
fn wraps_table(table: ElementRef<'_>) -> bool {
    table
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "table")
}

fn rows_with_columns(
    headers: &[String],
    rows: &[Vec<String>],
    column: fn(&str) -> Option<&'static str>,
) -> Vec<BTreeMap<String, String>> {
    rows.iter()
        .map(|row| {
            let mut out = BTreeMap::new();
            for (header, cell) in headers.iter().zip(row.iter()) {
                if let Some(key) = column(header) {
                    if !cell.is_empty() {
                        out.entry(key.to_string()).or_insert_with(|| cell.clone());
                    }
                }
            }
            out
        })
        .filter(|row: &BTreeMap<String, String>| !row.is_empty())
        .collect()
}

fn action_column(header: &str) -> Option<&'static str> {
    if header.contains("filed by") || header.contains("filer") || header.contains("party") {
        Some(field::FILED_BY)
    } else if header.contains("date") {
        Some(field::DATE)
    } else if header.contains("action") || header.contains("docket") || header.contains("proceeding")
    {
        Some(field::ACTION)
    } else if header.contains("description") || header.contains("text") || header.contains("comment")
    {
        Some(field::DESCRIPTION)
    } else {
        None
    }
}

fn event_column(header: &str) -> Option<&'static str> {
    if header.contains("date") {
        Some(field::DATE)
    } else if header.contains("time") {
        Some(field::TIME)
    } else if header.contains("dept") || header.contains("department") || header.contains("courtroom")
    {
        Some(field::DEPARTMENT)
    } else if header.contains("type") || header.contains("event") || header.contains("hearing") {
        Some(field::EVENT_TYPE)
    } else if header.contains("description") || header.contains("result") || header.contains("location")
    {
        Some(field::DESCRIPTION)
    } else {
        None
    }
}

fn result_column(header: &str) -> Option<&'static str> {
    if header.contains("case number") || header.contains("case no") || header.contains("case #") {
        Some(field::CASE_NUMBER)
    } else if header.contains("title") || header.contains("case name") || header.contains("style") {
        Some(field::CASE_TITLE)
    } else if header.contains("type") || header.contains("category") {
        Some(field::CASE_TYPE)
    } else if header.contains("status") {
        Some(field::STATUS)
    } else if header.contains("filed") || header.contains("filing") || header.contains("date") {
        Some(field::DATE_FILED)
    } else if header.contains("dept") || header.contains("department") {
        Some(field::DEPARTMENT)
    } else if header.contains("judge") || header.contains("officer") {
        Some(field::JUDGE)
    } else if header.contains("party") || header.contains("name") {
        Some("party")
    } else {
        None
    }
}

// ── Text helpers ────────────────────────────────────────────────────────────

/// Flatten the document body to text with one line per block element.
///
/// A line that starts with `:` is glued to the line before it, so
/// `<span>Judge</span><div>: Hon. X</div>` still reads `Judge: Hon. X`.
pub fn flatten_text(document: &Html) -> String {
    let mut out = String::new();
    flatten_into(document.root_element(), &mut out);

    let mut lines: Vec<String> = Vec::new();
    for line in out.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            continue;
        }
        match lines.last_mut() {
            Some(last) if line.starts_with(':') => last.push_str(&line),
            _ => lines.push(line),
        }
    }
    lines.join("\n")
}

fn flatten_into(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(el) = ElementRef::wrap(child) {
            let name = el.value().name();
            if SKIPPED_ELEMENTS.contains(&name) {
                continue;
            }
            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                out.push('\n');
            }
            flatten_into(el, out);
            if block {
                out.push('\n');
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn says_no_results(text: &str) -> bool {
    no_results_re().is_match(text)
}

// ── Compiled patterns ───────────────────────────────────────────────────────

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("selector literal is valid")
}

fn field_patterns() -> &'static BTreeMap<&'static str, Regex> {
    static PATTERNS: OnceLock<BTreeMap<&'static str, Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FIELD_LABELS
            .iter()
            .map(|(key, labels)| {
                let pattern = format!(
                    r"(?im)(?:^|\s)(?P<label>{})[ \t]*:[:\s]*(?P<value>[^<\n]+)",
                    labels.join("|")
                );
                (*key, Regex::new(&pattern).expect("field label regex is valid"))
            })
            .collect()
    })
}

/// Whole-cell label matchers for `label | value` rows.
fn exact_label_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FIELD_LABELS
            .iter()
            .map(|(key, labels)| {
                let pattern = format!("(?i)^(?:{})$", labels.join("|"));
                (*key, Regex::new(&pattern).expect("exact label regex is valid"))
            })
            .collect()
    })
}

fn all_label_alternation() -> String {
    FIELD_LABELS
        .iter()
        .flat_map(|(_, labels)| labels.iter().copied())
        .chain(PARTY_LABELS.iter().copied())
        .collect::<Vec<_>>()
        .join("|")
}

/// A value that is itself just another label.
fn label_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)^(?:{})[ \t]*:", all_label_alternation()))
            .expect("label line regex is valid")
    })
}

fn label_anywhere_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\s(?:{})[ \t]*:", all_label_alternation()))
            .expect("inline label regex is valid")
    })
}

fn party_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?im)^[ \t]*({})s?[ \t]*:[:\s]*([^<\n]+)",
            PARTY_LABELS.join("|")
        ))
        .expect("party label regex is valid")
    })
}

fn upgrade_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bupgrade\b[^\n]*?\bto\s+(?:view|see|access)\s+([^<\n.!]+)")
            .expect("upgrade regex is valid")
    })
}

fn no_results_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:no\s+(?:matching\s+)?(?:cases?|records?|results?)\s+(?:were\s+)?found|no\s+matching\s+(?:cases?|records?)|returned\s+no\s+results|0\s+(?:cases|records|results)\s+found)\b",
        )
        .expect("no-results regex is valid")
    })
}

fn case_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)case_?(?:number|num|no)=([A-Za-z0-9\-]+)").expect("case param regex is valid")
    })
}
