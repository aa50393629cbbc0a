//! Parse one output line into zero or one event.

use std::path::PathBuf;

use super::category::CategoryHints;
use super::{ConcurrencyAdvertisement, Event, RunComplete, RunStart};

pub const TAG_CONCURRENCY: &str = "[CONCURRENCY]";
pub const TAG_RUN_START: &str = "[RUN_START]";
pub const TAG_RUN_COMPLETE: &str = "[RUN_COMPLETE]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Concurrency,
    RunStart,
    RunComplete,
}

const TAGS: [(Tag, &str); 3] = [
    (Tag::Concurrency, TAG_CONCURRENCY),
    (Tag::RunStart, TAG_RUN_START),
    (Tag::RunComplete, TAG_RUN_COMPLETE),
];

/// Decode one line of job output. Unrecognized or malformed lines yield an
/// empty vec.
pub fn decode(line: &str, hints: &CategoryHints) -> Vec<Event> {
    let Some((tag, rest)) = find_tag(line) else {
        return Vec::new();
    };
    let fields = Fields::parse(rest);
    let event = match tag {
        Tag::Concurrency => decode_advertisement(&fields),
        Tag::RunStart => decode_run_start(&fields, hints),
        Tag::RunComplete => decode_run_complete(&fields, hints),
    };
    event.into_iter().collect()
}

/// Earliest recognized tag in the line and the text following it.
fn find_tag(line: &str) -> Option<(Tag, &str)> {
    TAGS.iter()
        .filter_map(|(tag, marker)| line.find(marker).map(|pos| (pos, *tag, marker.len())))
        .min_by_key(|(pos, _, _)| *pos)
        .map(|(pos, tag, len)| (tag, &line[pos + len..]))
}

/// `key=value` tokens in line order. A token without `=` continues the
/// previous value, so free-text values (errors, statuses) keep their spaces.
struct Fields(Vec<(String, String)>);

impl Fields {
    fn parse(rest: &str) -> Self {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for token in rest.split_whitespace() {
            match token.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    pairs.push((key.to_ascii_lowercase(), value.to_string()));
                }
                _ => {
                    if let Some((_, value)) = pairs.last_mut() {
                        value.push(' ');
                        value.push_str(token);
                    }
                }
            }
        }
        Fields(pairs)
    }

    /// First value for `key`, treating empty and `na` as absent.
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("na"))
    }

    fn owned(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "ok" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_seconds(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

fn decode_advertisement(fields: &Fields) -> Option<Event> {
    let max_concurrency = fields.get("max_concurrency")?.parse::<usize>().ok()?;
    let enabled = fields.get("enabled").and_then(parse_bool).unwrap_or(true);
    let qps = fields.get("qps").and_then(|v| v.parse::<f64>().ok());
    Some(Event::ConcurrencyAdvertisement(ConcurrencyAdvertisement {
        enabled,
        max_concurrency,
        qps,
    }))
}

fn decode_run_start(fields: &Fields, hints: &CategoryHints) -> Option<Event> {
    let id = fields.owned("id")?;
    let provider = fields.owned("provider").unwrap_or_default();
    let model = fields.owned("model").unwrap_or_default();
    let category = hints.resolve(fields.get("category"), &provider, &model);
    let attempt = fields
        .get("attempt")
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(1);
    Some(Event::RunStart(RunStart {
        id,
        category,
        provider,
        model,
        target: fields.owned("target"),
        output: fields.owned("output"),
        attempt,
    }))
}

fn decode_run_complete(fields: &Fields, hints: &CategoryHints) -> Option<Event> {
    let id = fields.owned("id")?;
    let provider = fields.owned("provider").unwrap_or_default();
    let model = fields.owned("model").unwrap_or_default();
    let category = hints.resolve(fields.get("category"), &provider, &model);
    let ok = fields.get("ok").and_then(parse_bool).unwrap_or(false);
    Some(Event::RunComplete(RunComplete {
        id,
        category,
        provider,
        model,
        ok,
        elapsed_seconds: fields.get("elapsed_seconds").and_then(parse_seconds),
        status: fields.owned("status"),
        output_path: fields.get("output_path").map(PathBuf::from),
        error: fields.owned("error"),
    }))
}
