// Prometheus text exposition format parser (node exporter /metrics bodies)

mod sample;

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Declared type of a metric family (`# TYPE` line). Families without a declaration are untyped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Summary,
    Histogram,
    Untyped,
}

impl MetricKind {
    fn from_type_token(s: &str) -> Option<Self> {
        match s {
            "counter" => Some(MetricKind::Counter),
            "gauge" => Some(MetricKind::Gauge),
            "summary" => Some(MetricKind::Summary),
            "histogram" => Some(MetricKind::Histogram),
            "untyped" => Some(MetricKind::Untyped),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Full sample name; differs from the family name for `_sum`/`_count`/`_bucket` children.
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
    pub timestamp_ms: Option<i64>,
}

impl Sample {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: Option<String>,
    pub kind: MetricKind,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            help: None,
            kind: MetricKind::Untyped,
            samples: Vec::new(),
        }
    }
}

/// Parsed body: family name -> family.
pub type MetricFamilies = HashMap<String, MetricFamily>;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number in the body.
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("invalid metric name {0:?}")]
    InvalidMetricName(String),
    #[error("invalid label set: {0}")]
    InvalidLabel(String),
    #[error("missing sample value")]
    MissingValue,
    #[error("invalid sample value {0:?}")]
    InvalidValue(String),
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),
    #[error("unknown metric type {0:?}")]
    UnknownType(String),
    #[error("second TYPE line for {0}")]
    DuplicateType(String),
}

/// Parse a full exposition body into metric families.
pub fn parse(text: &str) -> Result<MetricFamilies, ParseError> {
    let mut families = MetricFamilies::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let result = match line.strip_prefix('#') {
            Some(comment) => apply_comment(comment, &mut families),
            None => sample::parse_sample(line).map(|s| {
                let owner = owning_family(&families, &s.name);
                families
                    .entry(owner.clone())
                    .or_insert_with(|| MetricFamily::new(&owner))
                    .samples
                    .push(s);
            }),
        };
        result.map_err(|kind| ParseError {
            line: idx + 1,
            kind,
        })?;
    }
    Ok(families)
}

/// Keep only the families named in `allow_list`.
pub fn retain_allowed(families: MetricFamilies, allow_list: &[&str]) -> MetricFamilies {
    families
        .into_iter()
        .filter(|(name, _)| allow_list.contains(&name.as_str()))
        .collect()
}

fn apply_comment(comment: &str, families: &mut MetricFamilies) -> Result<(), ParseErrorKind> {
    let (keyword, rest) = split_token(comment);
    match keyword {
        "HELP" => {
            let (name, text) = split_token(rest);
            sample::validate_metric_name(name)?;
            families
                .entry(name.to_string())
                .or_insert_with(|| MetricFamily::new(name))
                .help = Some(unescape_help(text.trim()));
        }
        "TYPE" => {
            let (name, kind) = split_token(rest);
            sample::validate_metric_name(name)?;
            let kind_token = kind.trim();
            let kind = MetricKind::from_type_token(kind_token)
                .ok_or_else(|| ParseErrorKind::UnknownType(kind_token.to_string()))?;
            let family = families
                .entry(name.to_string())
                .or_insert_with(|| MetricFamily::new(name));
            if family.kind != MetricKind::Untyped {
                return Err(ParseErrorKind::DuplicateType(name.to_string()));
            }
            family.kind = kind;
        }
        // Free-form comment.
        _ => {}
    }
    Ok(())
}

/// Summary and histogram children (`x_sum`, `x_count`, `x_bucket`) belong to `x`.
fn owning_family(families: &MetricFamilies, sample_name: &str) -> String {
    if families.contains_key(sample_name) {
        return sample_name.to_string();
    }
    for suffix in ["_sum", "_count", "_bucket"] {
        if let Some(base) = sample_name.strip_suffix(suffix)
            && let Some(family) = families.get(base)
            && matches!(family.kind, MetricKind::Summary | MetricKind::Histogram)
        {
            return base.to_string();
        }
    }
    sample_name.to_string()
}

fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], &s[i..]),
        None => (s, ""),
    }
}

fn unescape_help(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
