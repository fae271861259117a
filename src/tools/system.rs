//! System configuration operations: option search and lookup, rebuild,
//! generation listing.

use super::{CallOptions, NixTools};
use crate::params::{
    ApplySystemConfigurationParams, DEFAULT_GENERATION_LIMIT, DEFAULT_MAX_RESULTS,
    DescribeSystemOptionParams, ListSystemGenerationsParams, OperationParams,
    SearchSystemOptionsParams,
};
use crate::result::{NormalizedResult, Payload};
use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;

/// One line of `nix-env --list-generations`, e.g. `  42   2024-03-01 09:00:00   (current)`.
static GENERATION_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s+(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})\s*(\(current\))?\s*$")
        .expect("Invalid generation line regex")
});

const GENERATION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl NixTools {
    /// Find system options whose name contains the query.
    pub fn search_system_options(
        &self,
        params: SearchSystemOptionsParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::SearchSystemOptions(params), options)
    }

    pub fn describe_system_option(
        &self,
        params: DescribeSystemOptionParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::DescribeSystemOption(params), options)
    }

    /// Build and (unless dry-run) activate a system configuration.
    pub fn apply_system_configuration(
        &self,
        params: ApplySystemConfigurationParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::ApplySystemConfiguration(params), options)
    }

    /// List the most recent generations of a profile.
    pub fn list_system_generations(
        &self,
        params: ListSystemGenerationsParams,
        options: &CallOptions,
    ) -> NormalizedResult {
        self.call(&OperationParams::ListSystemGenerations(params), options)
    }
}

/// Warn when the evaluator found more options than it returned.
pub(super) fn note_option_truncation(
    payload: Payload,
    params: &SearchSystemOptionsParams,
    warnings: &mut Vec<String>,
) -> Payload {
    if let Payload::Structured(value) = &payload {
        let total = value["total"].as_u64().unwrap_or(0) as usize;
        let kept = value["options"].as_array().map_or(0, Vec::len);
        if total > kept {
            warnings.push(format!(
                "showing {} of {} options matching '{}'; narrow the query or raise max_results (default {})",
                kept, total, params.query, DEFAULT_MAX_RESULTS
            ));
        }
    }
    payload
}

/// Parse the generation listing into `{profile, total, generations}`.
pub(super) fn parse_generations(
    payload: Payload,
    params: &ListSystemGenerationsParams,
    warnings: &mut Vec<String>,
) -> Payload {
    let text = match payload {
        Payload::Text(text) => text,
        structured => return structured,
    };

    let mut generations = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match parse_generation_line(line) {
            Some(generation) => generations.push(generation),
            None => warnings.push(format!("skipped unrecognized generation line: {}", line.trim())),
        }
    }

    let total = generations.len();
    let limit = params.limit.unwrap_or(DEFAULT_GENERATION_LIMIT);
    let recent = generations.split_off(total.saturating_sub(limit));

    Payload::Structured(json!({
        "profile": params.profile_name(),
        "total": total,
        "generations": recent,
    }))
}

fn parse_generation_line(line: &str) -> Option<Value> {
    let caps = GENERATION_LINE_REGEX.captures(line)?;
    let id: u64 = caps[1].parse().ok()?;
    let date = caps[2].split_whitespace().collect::<Vec<_>>().join(" ");
    let date = NaiveDateTime::parse_from_str(&date, GENERATION_DATE_FORMAT).ok()?;
    Some(json!({
        "id": id,
        "date": date.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "current": caps.get(3).is_some(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "   1   2024-01-02 10:00:00   \n\
                           \x20  2   2024-02-03 11:30:15   \n\
                           \x20  3   2024-03-04 12:45:30   (current)\n";

    #[test]
    fn generations_are_parsed_with_current_marker() {
        let mut warnings = Vec::new();
        let payload = parse_generations(
            Payload::Text(LISTING.to_string()),
            &ListSystemGenerationsParams::default(),
            &mut warnings,
        );
        assert_eq!(
            payload,
            Payload::Structured(json!({
                "profile": "system",
                "total": 3,
                "generations": [
                    {"id": 1, "date": "2024-01-02T10:00:00", "current": false},
                    {"id": 2, "date": "2024-02-03T11:30:15", "current": false},
                    {"id": 3, "date": "2024-03-04T12:45:30", "current": true}
                ]
            }))
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn generations_keep_the_most_recent() {
        let mut warnings = Vec::new();
        let payload = parse_generations(
            Payload::Text(LISTING.to_string()),
            &ListSystemGenerationsParams {
                profile: None,
                limit: Some(1),
            },
            &mut warnings,
        );
        let value = payload.as_structured().unwrap();
        assert_eq!(value["total"], 3);
        assert_eq!(value["generations"], json!([
            {"id": 3, "date": "2024-03-04T12:45:30", "current": true}
        ]));
    }

    #[test]
    fn unrecognized_lines_become_warnings() {
        let mut warnings = Vec::new();
        let payload = parse_generations(
            Payload::Text("error: something odd\n   7   2024-05-06 07:08:09\n".to_string()),
            &ListSystemGenerationsParams::default(),
            &mut warnings,
        );
        assert_eq!(payload.as_structured().unwrap()["total"], 1);
        assert_eq!(warnings, vec!["skipped unrecognized generation line: error: something odd"]);
    }

    #[test]
    fn option_truncation_warns_only_when_cut() {
        let params = SearchSystemOptionsParams {
            query: "nginx".to_string(),
            max_results: Some(1),
        };
        let mut warnings = Vec::new();
        note_option_truncation(
            Payload::Structured(json!({"total": 1, "options": [{"name": "services.nginx.enable"}]})),
            &params,
            &mut warnings,
        );
        assert!(warnings.is_empty());

        note_option_truncation(
            Payload::Structured(json!({"total": 40, "options": [{"name": "services.nginx.enable"}]})),
            &params,
            &mut warnings,
        );
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("showing 1 of 40 options"));
    }
}
