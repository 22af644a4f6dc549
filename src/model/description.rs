use log::trace;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// The fields pulled out of the free text body of a feed item
///
/// Every field is best effort, a field that could not be found is an empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedFields {
    pub date_start: String,
    pub date_end: String,
    pub time: String,
    pub location: String,
}

/// A single extraction rule: the first match of `pattern` in the body sets one or more fields
struct FieldRule {
    name: &'static str,
    pattern: Regex,
    apply: fn(&Captures, &mut ParsedFields),
}

impl FieldRule {
    fn new(name: &'static str, pattern: &str, apply: fn(&Captures, &mut ParsedFields)) -> Self {
        FieldRule {
            name,
            pattern: Regex::new(pattern).expect("field rule pattern must compile"),
            apply,
        }
    }
}

/// The rules are independent of each other, new feed conventions are added here
static FIELD_RULES: Lazy<Vec<FieldRule>> = Lazy::new(|| {
    vec![
        FieldRule::new(
            "date",
            r"(?i)Event dates?:\s*([A-Za-z]+\s+\d{1,2},\s+\d{4})(\s*-\s*([A-Za-z]+\s+\d{1,2},\s+\d{4}))?",
            |caps, fields| {
                fields.date_start = capture(caps, 1);
                fields.date_end = capture(caps, 3);
            },
        ),
        FieldRule::new("time", r"(?i)Event Time:\s*(.+)", |caps, fields| {
            fields.time = capture(caps, 1)
        }),
        FieldRule::new("location", r"(?i)Location:\s*(.+)", |caps, fields| {
            fields.location = capture(caps, 1)
        }),
    ]
});

static LINE_BREAK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static PARAGRAPH_END_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</p>").unwrap());
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Extracts the date range, time, and location from the body of a feed item
///
/// Each field comes from the first match of its rule against the whole cleaned text.
/// A body without a given section simply leaves that field empty.
pub fn parse(body: &str) -> ParsedFields {
    let text = strip_html(body);

    // drop blank lines so the rules see one section per line
    let joined = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let mut fields = ParsedFields::default();
    for rule in FIELD_RULES.iter() {
        match rule.pattern.captures(&joined) {
            Some(caps) => (rule.apply)(&caps, &mut fields),
            None => trace!("no {} found in description", rule.name),
        }
    }
    fields
}

/// Removes markup from a description and decodes the few entities the feed uses
///
/// `<br>` and `</p>` become line breaks, every other tag is removed.
pub fn strip_html(s: &str) -> String {
    let s = LINE_BREAK_TAG.replace_all(s, "\n");
    let s = PARAGRAPH_END_TAG.replace_all(&s, "\n");
    let s = ANY_TAG.replace_all(&s, "");
    s.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

/// Collapses every run of whitespace into a single space and trims the ends
pub fn clean_line(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

fn capture(caps: &Captures, group: usize) -> String {
    caps.get(group)
        .map(|m| clean_line(m.as_str()))
        .unwrap_or_default()
}
