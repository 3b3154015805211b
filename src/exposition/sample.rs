// Single sample line: name{label="value",...} value [timestamp]

use super::{ParseErrorKind, Sample};
use std::collections::BTreeMap;

pub(super) fn parse_sample(line: &str) -> Result<Sample, ParseErrorKind> {
    let name_end = line
        .find(|c: char| !is_name_char(c))
        .unwrap_or(line.len());
    let name = &line[..name_end];
    validate_metric_name(name)?;

    let mut rest = &line[name_end..];
    let labels = match rest.strip_prefix('{') {
        Some(after_brace) => {
            let (labels, remainder) = parse_labels(after_brace)?;
            rest = remainder;
            labels
        }
        None => BTreeMap::new(),
    };

    let mut tokens = rest.split_whitespace();
    let value_token = tokens.next().ok_or(ParseErrorKind::MissingValue)?;
    let value = parse_value(value_token)?;
    let timestamp_ms = tokens
        .next()
        .map(|t| {
            t.parse::<i64>()
                .map_err(|_| ParseErrorKind::InvalidTimestamp(t.to_string()))
        })
        .transpose()?;
    if let Some(extra) = tokens.next() {
        return Err(ParseErrorKind::TrailingInput(extra.to_string()));
    }

    Ok(Sample {
        name: name.to_string(),
        labels,
        value,
        timestamp_ms,
    })
}

pub(super) fn validate_metric_name(name: &str) -> Result<(), ParseErrorKind> {
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && name.chars().all(is_name_char);
    if valid {
        Ok(())
    } else {
        Err(ParseErrorKind::InvalidMetricName(name.to_string()))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

/// Parses the inside of `{...}`; returns the labels and the input after the closing brace.
fn parse_labels(mut s: &str) -> Result<(BTreeMap<String, String>, &str), ParseErrorKind> {
    let mut labels = BTreeMap::new();
    loop {
        s = s.trim_start();
        if let Some(after) = s.strip_prefix('}') {
            return Ok((labels, after));
        }

        let key_end = s
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .ok_or_else(|| ParseErrorKind::InvalidLabel("unterminated label set".into()))?;
        let key = &s[..key_end];
        if key.is_empty() || key.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ParseErrorKind::InvalidLabel(format!(
                "bad label name near {:?}",
                truncate(s)
            )));
        }
        s = s[key_end..].trim_start();
        s = s
            .strip_prefix('=')
            .ok_or_else(|| ParseErrorKind::InvalidLabel(format!("expected '=' after {key}")))?
            .trim_start();
        s = s.strip_prefix('"').ok_or_else(|| {
            ParseErrorKind::InvalidLabel(format!("expected quoted value for {key}"))
        })?;

        let (value, after_value) = read_quoted(s)
            .ok_or_else(|| ParseErrorKind::InvalidLabel(format!("unterminated value for {key}")))?;
        labels.insert(key.to_string(), value);

        s = after_value.trim_start();
        if let Some(after_comma) = s.strip_prefix(',') {
            s = after_comma;
        } else if !s.starts_with('}') {
            return Err(ParseErrorKind::InvalidLabel(format!(
                "expected ',' or '}}' after {key}"
            )));
        }
    }
}

/// Reads an escaped label value up to the closing quote (already past the opening one).
fn read_quoted(s: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((value, &s[i + 1..])),
            '\\' => match chars.next()?.1 {
                'n' => value.push('\n'),
                '"' => value.push('"'),
                '\\' => value.push('\\'),
                other => {
                    value.push('\\');
                    value.push(other);
                }
            },
            _ => value.push(c),
        }
    }
    None
}

fn parse_value(token: &str) -> Result<f64, ParseErrorKind> {
    match token {
        "NaN" => Ok(f64::NAN),
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        _ => token
            .parse::<f64>()
            .map_err(|_| ParseErrorKind::InvalidValue(token.to_string())),
    }
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(16) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
