//! Filter pipeline
//!
//! Patterns may contain twig-like expressions such as
//! `{{ value|trim|upper }}` or `{{ dcterms:date|date("Y") }}`. Each filter is
//! a `name(args) → fn(&str) → String` entry in a closed registry. Unknown
//! filters leave the value untouched.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One parsed filter call, e.g. `slice(0, 3)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// A twig expression: the variable to read and the filters to run on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub variable: String,
    pub filters: Vec<Filter>,
}

impl Pipeline {
    /// Parse the inside of `{{ … }}`.
    pub fn parse(expression: &str) -> Option<Self> {
        let mut parts = split_outside_quotes(expression, '|').into_iter();
        let variable = parts.next()?.trim().to_string();
        if variable.is_empty() {
            return None;
        }
        let filters = parts.filter_map(|part| Filter::parse(&part)).collect();
        Some(Self { variable, filters })
    }

    pub fn apply(&self, value: &str) -> String {
        self.filters
            .iter()
            .fold(value.to_string(), |acc, filter| filter.apply(&acc))
    }
}

impl Filter {
    pub fn parse(call: &str) -> Option<Self> {
        let call = call.trim();
        if call.is_empty() {
            return None;
        }
        match call.find('(') {
            Some(open) if call.ends_with(')') => {
                let name = call[..open].trim().to_string();
                let inner = &call[open + 1..call.len() - 1];
                let args = if inner.trim().is_empty() {
                    Vec::new()
                } else {
                    split_outside_quotes(inner, ',')
                        .iter()
                        .map(|a| unquote(a.trim()))
                        .collect()
                };
                Some(Self { name, args })
            }
            _ => Some(Self {
                name: call.to_string(),
                args: Vec::new(),
            }),
        }
    }

    pub fn apply(&self, value: &str) -> String {
        match self.name.as_str() {
            "abs" => abs(value),
            "capitalize" => capitalize(value),
            "escape" | "e" => quick_xml::escape::escape(value).into_owned(),
            "first" => value.chars().next().map(String::from).unwrap_or_default(),
            "last" => value.chars().last().map(String::from).unwrap_or_default(),
            "length" => value.chars().count().to_string(),
            "lower" => value.to_lowercase(),
            "upper" => value.to_uppercase(),
            "striptags" => strip_tags(value),
            "title" => title(value),
            "trim" => value.trim().to_string(),
            "url_encode" => url_encode(value),
            "date" => date(value, self.args.first().map(String::as_str).unwrap_or("F j, Y H:i")),
            "format" => format(value, &self.args),
            "slice" => slice(value, &self.args),
            _ => value.to_string(),
        }
    }
}

fn abs(value: &str) -> String {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return n.unsigned_abs().to_string();
    }
    match trimmed.parse::<f64>() {
        Ok(f) => f.abs().to_string(),
        Err(_) => value.to_string(),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

fn title(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn strip_tags(value: &str) -> String {
    let fragment = scraper::Html::parse_fragment(value);
    fragment.root_element().text().collect::<String>()
}

// Raw URL encoding: spaces become %20 and `~` is kept.
fn url_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace("%7E", "~")
}

fn date(value: &str, format: &str) -> String {
    match parse_date(value.trim()) {
        Some(datetime) => Utc
            .from_utc_datetime(&datetime)
            .format(&php_to_strftime(format))
            .to_string(),
        None => value.to_string(),
    }
}

fn parse_date(value: &str) -> Option<NaiveDateTime> {
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%Y%m%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    if value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        let year = value.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0);
    }
    if value.starts_with('@') || value.chars().all(|c| c.is_ascii_digit()) {
        let ts = value.trim_start_matches('@').parse::<i64>().ok()?;
        return DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| dt.naive_utc());
    }
    None
}

/// Translate a PHP `date()` format string into a strftime one.
fn php_to_strftime(format: &str) -> String {
    let mut out = String::new();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        let spec = match c {
            'd' => "%d",
            'D' => "%a",
            'j' => "%-d",
            'l' => "%A",
            'N' => "%u",
            'w' => "%w",
            'z' => "%j",
            'W' => "%V",
            'F' => "%B",
            'm' => "%m",
            'M' => "%b",
            'n' => "%-m",
            'Y' => "%Y",
            'y' => "%y",
            'a' => "%P",
            'A' => "%p",
            'g' => "%-I",
            'G' => "%-H",
            'h' => "%I",
            'H' => "%H",
            'i' => "%M",
            's' => "%S",
            'U' => "%s",
            'c' => "%Y-%m-%dT%H:%M:%S%:z",
            'r' => "%a, %d %b %Y %H:%M:%S %z",
            '%' => "%%",
            '\\' => {
                if let Some(next) = chars.next() {
                    if next == '%' {
                        out.push_str("%%");
                    } else {
                        out.push(next);
                    }
                }
                continue;
            }
            other => {
                out.push(other);
                continue;
            }
        };
        out.push_str(spec);
    }
    out
}

// `value` is the format string, as in `"%s (%s)"|format(a, b)`.
fn format(value: &str, args: &[String]) -> String {
    let mut out = String::new();
    let mut args = args.iter();
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('s') | Some('d') => {
                if let Some(arg) = args.next() {
                    out.push_str(arg);
                }
            }
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}

fn slice(value: &str, args: &[String]) -> String {
    let chars: Vec<char> = value.chars().collect();
    let total = chars.len() as i64;
    let start = args.first().and_then(|a| a.trim().parse::<i64>().ok()).unwrap_or(0);
    let start = if start < 0 { total.saturating_add(start).max(0) } else { start.min(total) };
    let end = match args.get(1).and_then(|a| a.trim().parse::<i64>().ok()) {
        Some(len) if len < 0 => total.saturating_add(len),
        Some(len) => start.saturating_add(len).min(total),
        None => total,
    }
    .max(start);
    chars[start as usize..end as usize].iter().collect()
}

fn unquote(arg: &str) -> String {
    let bytes = arg.as_bytes();
    if bytes.len() >= 2
        && ((bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\''))
    {
        arg[1..arg.len() - 1].to_string()
    } else {
        arg.to_string()
    }
}

/// Split on `separator` when it is outside quotes and parentheses.
fn split_outside_quotes(text: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    for c in text.chars() {
        match (quote, c) {
            (Some(q), _) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), _) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                current.push(c);
            }
            (None, '(') => {
                depth += 1;
                current.push(c);
            }
            (None, ')') => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            (None, _) if c == separator && depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(expression: &str, value: &str) -> String {
        Pipeline::parse(expression).unwrap().apply(value)
    }

    #[test]
    fn test_pipeline_left_to_right() {
        assert_eq!(run("value|upper|trim", "  paris "), "PARIS");
        assert_eq!(run("value|trim|length", "  paris "), "5");
    }

    #[test]
    fn test_slice() {
        assert_eq!(run("value|slice(0,3)", "Paris"), "Par");
        assert_eq!(run("value|slice(-3)", "Paris"), "ris");
        assert_eq!(run("value|slice(1, -1)", "Paris"), "ari");
        assert_eq!(run("value|slice(10,2)", "Paris"), "");
    }

    #[test]
    fn test_slice_extreme_bounds() {
        assert_eq!(run("value|slice(1, 9223372036854775807)", "Paris"), "aris");
        assert_eq!(run("value|slice(-9223372036854775808, 2)", "Paris"), "Pa");
        assert_eq!(run("value|slice(2, -9223372036854775808)", "Paris"), "");
        assert_eq!(run("value|slice(9223372036854775807)", "Paris"), "");
    }

    #[test]
    fn test_text_filters() {
        assert_eq!(run("value|capitalize", "hELLO wORLD"), "Hello world");
        assert_eq!(run("value|title", "hELLO wORLD"), "Hello World");
        assert_eq!(run("value|first", "Paris"), "P");
        assert_eq!(run("value|last", "Paris"), "s");
        assert_eq!(run("value|lower", "PARIS"), "paris");
        assert_eq!(run("value|abs", "-12"), "12");
        assert_eq!(run("value|abs", "n/a"), "n/a");
        assert_eq!(run("value|abs", "-9223372036854775808"), "9223372036854775808");
    }

    #[test]
    fn test_markup_filters() {
        assert_eq!(run("value|striptags", "<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(run("value|e", "a < b & c"), "a &lt; b &amp; c");
        assert_eq!(run("value|url_encode", "a b/c~"), "a%20b%2Fc~");
    }

    #[test]
    fn test_date_and_format() {
        assert_eq!(run(r#"value|date("Y")"#, "2021-03-04"), "2021");
        assert_eq!(run(r#"value|date('d/m/Y')"#, "2021-03-04T10:00:00Z"), "04/03/2021");
        assert_eq!(run(r#"value|date("Y")"#, "someday"), "someday");
        assert_eq!(run(r#"value|format("a", "b")"#, "%s-%s (100%%)"), "a-b (100%)");
    }

    #[test]
    fn test_unknown_filter_is_identity() {
        assert_eq!(run("value|shout|trim", " x "), "x");
    }

    #[test]
    fn test_parse_pipeline() {
        let pipeline = Pipeline::parse(r#" dcterms:date | date("Y|m") | slice(0, 2) "#).unwrap();
        assert_eq!(pipeline.variable, "dcterms:date");
        assert_eq!(pipeline.filters.len(), 2);
        assert_eq!(pipeline.filters[0].args, vec!["Y|m".to_string()]);
        assert_eq!(pipeline.filters[1].args, vec!["0".to_string(), "2".to_string()]);
        assert!(Pipeline::parse("  |upper").is_none());
    }
}
