/// Turns raw generator text into a typed reply
///
/// Validation is deliberately shallow: the shape is checked, the values are
/// not. A year of 3021 passes here and simply fails to match in the catalog.
/// Every failure keeps the original text so it can be shown for diagnosis.
use serde_json::{Map, Value};

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, GeneratorReply, RecommendationDraft, MAX_CANDIDATES},
};

/// Strip markdown code fences the model may wrap its JSON in
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();

    let clean = match trimmed.strip_prefix("```") {
        Some(rest) => {
            // Drop an info string such as `json` on the opening fence line
            let tag_len = rest
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(rest.len());
            &rest[tag_len..]
        }
        None => trimmed,
    };

    let clean = clean.trim_end();
    let clean = clean.strip_suffix("```").unwrap_or(clean);
    clean.trim()
}

/// Parse a generator reply
///
/// Fails with a format error unless the payload is a JSON object holding a
/// `recommendations` array whose every element has `title`, `year` and
/// `reason`. An object without `recommendations` but with a non-empty
/// `clarification` string is read as a clarification question.
pub fn parse(raw_text: &str) -> AppResult<GeneratorReply> {
    let fail = |reason: String| AppError::format(raw_text, reason);

    let body = strip_code_fences(raw_text);
    let value: Value =
        serde_json::from_str(body).map_err(|e| fail(format!("response is not valid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| fail("response is not a JSON object".to_string()))?;

    let recommendations = match object.get("recommendations") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(fail("`recommendations` is not an array".to_string())),
        None => {
            return match clarification(object) {
                Some(question) => Ok(GeneratorReply::Clarification { question }),
                None => Err(fail("response has no `recommendations` field".to_string())),
            };
        }
    };

    let mut candidates = recommendations
        .iter()
        .enumerate()
        .map(|(index, item)| candidate(index, item).map_err(&fail))
        .collect::<AppResult<Vec<Candidate>>>()?;

    if candidates.len() > MAX_CANDIDATES {
        tracing::warn!(
            proposed = candidates.len(),
            kept = MAX_CANDIDATES,
            "Generator proposed too many candidates, truncating"
        );
        candidates.truncate(MAX_CANDIDATES);
    }

    let summary_text = ["message", "summary"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    Ok(GeneratorReply::Recommendations(RecommendationDraft {
        summary_text,
        candidates,
    }))
}

fn clarification(object: &Map<String, Value>) -> Option<String> {
    object
        .get("clarification")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
}

fn candidate(index: usize, item: &Value) -> Result<Candidate, String> {
    let object = item
        .as_object()
        .ok_or_else(|| format!("recommendation #{} is not an object", index + 1))?;

    let text_field = |name: &str| -> Result<String, String> {
        match object.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(format!("recommendation #{} has a non-string `{}`", index + 1, name)),
            None => Err(format!("recommendation #{} is missing `{}`", index + 1, name)),
        }
    };

    let title = text_field("title")?;
    let reason = text_field("reason")?;

    let year = match object.get("year") {
        Some(value) => parse_year(value)
            .ok_or_else(|| format!("recommendation #{} has a non-integer `year`", index + 1))?,
        None => return Err(format!("recommendation #{} is missing `year`", index + 1)),
    };

    Ok(Candidate { title, year, reason })
}

/// Accepts `1999` as well as `"1999"`; models emit both
fn parse_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"{
        "message": "Two tense thrillers",
        "recommendations": [
            {"title": "Heat", "year": 1995, "reason": "A slow-burn cat and mouse."},
            {"title": "Sicario", "year": 2015, "reason": "Relentless tension."}
        ]
    }"#;

    fn draft(reply: GeneratorReply) -> RecommendationDraft {
        match reply {
            GeneratorReply::Recommendations(draft) => draft,
            other => panic!("expected recommendations, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_bare_json() {
        let draft = draft(parse(BARE).unwrap());
        assert_eq!(draft.summary_text, "Two tense thrillers");
        assert_eq!(draft.candidates.len(), 2);
        assert_eq!(draft.candidates[0].title, "Heat");
        assert_eq!(draft.candidates[1].year, 2015);
    }

    #[test]
    fn test_fenced_json_parses_like_bare_json() {
        let fenced = format!("```json\n{}\n```", BARE);
        assert_eq!(parse(&fenced).unwrap(), parse(BARE).unwrap());

        let plain_fence = format!("```\n{}\n```\n", BARE);
        assert_eq!(parse(&plain_fence).unwrap(), parse(BARE).unwrap());
    }

    #[test]
    fn test_strip_code_fences_leaves_bare_text_alone() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```JSON\n[]\n```"), "[]");
    }

    #[test]
    fn test_missing_recommendations_is_format_error_with_raw_text() {
        let raw = r#"{"foo": 1}"#;
        match parse(raw) {
            Err(AppError::Format { raw_text, reason }) => {
                assert_eq!(raw_text, raw);
                assert!(reason.contains("recommendations"));
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_keeps_original_text_including_fences() {
        let raw = "```json\nSure! Here are some movies\n```";
        match parse(raw) {
            Err(AppError::Format { raw_text, .. }) => assert_eq!(raw_text, raw),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_reply_is_format_error() {
        match parse("  \n ") {
            Err(AppError::Format { raw_text, .. }) => assert_eq!(raw_text, "  \n "),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_recommendations_must_be_array() {
        let err = parse(r#"{"recommendations": {"title": "Heat"}}"#).unwrap_err();
        assert!(matches!(err, AppError::Format { .. }));
    }

    #[test]
    fn test_element_missing_reason_is_rejected() {
        let raw = r#"{"recommendations": [{"title": "Heat", "year": 1995}]}"#;
        match parse(raw) {
            Err(AppError::Format { reason, .. }) => assert!(reason.contains("`reason`")),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_string_year_is_accepted() {
        let raw = r#"{"recommendations": [{"title": "Heat", "year": " 1995 ", "reason": "r"}]}"#;
        assert_eq!(draft(parse(raw).unwrap()).candidates[0].year, 1995);
    }

    #[test]
    fn test_non_numeric_year_is_rejected() {
        let raw = r#"{"recommendations": [{"title": "Heat", "year": "mid-90s", "reason": "r"}]}"#;
        assert!(matches!(parse(raw), Err(AppError::Format { .. })));
    }

    #[test]
    fn test_no_semantic_validation_on_year() {
        let raw = r#"{"recommendations": [{"title": "Future Film", "year": 3021, "reason": "r"}]}"#;
        assert_eq!(draft(parse(raw).unwrap()).candidates[0].year, 3021);
    }

    #[test]
    fn test_more_than_five_candidates_are_truncated() {
        let items: Vec<String> = (1..=7)
            .map(|i| format!(r#"{{"title": "Movie {}", "year": 2000, "reason": "r"}}"#, i))
            .collect();
        let raw = format!(r#"{{"recommendations": [{}]}}"#, items.join(","));

        let draft = draft(parse(&raw).unwrap());
        assert_eq!(draft.candidates.len(), MAX_CANDIDATES);
        assert_eq!(draft.candidates[4].title, "Movie 5");
    }

    #[test]
    fn test_empty_recommendations_are_valid() {
        let draft = draft(parse(r#"{"message": "Nothing fits", "recommendations": []}"#).unwrap());
        assert!(draft.candidates.is_empty());
        assert_eq!(draft.summary_text, "Nothing fits");
    }

    #[test]
    fn test_summary_alias_and_default() {
        let with_alias = r#"{"summary": "Short list", "recommendations": []}"#;
        assert_eq!(draft(parse(with_alias).unwrap()).summary_text, "Short list");

        let without = r#"{"recommendations": []}"#;
        assert_eq!(draft(parse(without).unwrap()).summary_text, "");
    }

    #[test]
    fn test_clarification_reply() {
        let raw = r#"{"clarification": "Do you want movies or series?"}"#;
        assert_eq!(
            parse(raw).unwrap(),
            GeneratorReply::Clarification {
                question: "Do you want movies or series?".to_string()
            }
        );
    }

    #[test]
    fn test_blank_clarification_is_format_error() {
        assert!(matches!(
            parse(r#"{"clarification": "  "}"#),
            Err(AppError::Format { .. })
        ));
    }
}
