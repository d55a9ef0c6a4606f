//! Turns a raw `generateContent` reply into an [`AnalysisReport`].

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::RadarResult;
use crate::gemini::{GenerateContentResponse, ResponsePart};
use crate::model::{
    AnalysisReport, DataFreshness, Forces, GroundingSource, Inversion, InvestmentAnalysis,
};

pub const DEFAULT_SOURCE_TITLE: &str = "即時參考來源";

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json\n?|```").unwrap());

/// The part of the report the model is asked to produce.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportPayload {
    title: String,
    summary: String,
    forces: Forces,
    inversion: Inversion,
    investments: InvestmentAnalysis,
    data_freshness: DataFreshness,
}

pub fn clean_json_response(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

fn first_parts(reply: &GenerateContentResponse) -> &[ResponsePart] {
    reply
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| c.parts.as_slice())
        .unwrap_or(&[])
}

/// Answer text of the first candidate, reasoning parts excluded.
pub fn response_text(reply: &GenerateContentResponse) -> String {
    first_parts(reply)
        .iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text.as_deref())
        .collect()
}

pub fn extract_thought(reply: &GenerateContentResponse) -> String {
    first_parts(reply)
        .iter()
        .filter(|p| p.thought)
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn collect_sources(reply: &GenerateContentResponse) -> Vec<GroundingSource> {
    let chunks = reply
        .candidates
        .first()
        .and_then(|c| c.grounding_metadata.as_ref())
        .map(|m| m.grounding_chunks.as_slice())
        .unwrap_or(&[]);

    chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .filter_map(|web| {
            let uri = web.uri.as_ref().filter(|u| !u.is_empty())?;
            let title = web
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE_TITLE.to_string());
            Some(GroundingSource {
                title: Some(title),
                uri: Some(uri.clone()),
            })
        })
        .collect()
}

fn validate(payload: &ReportPayload) -> RadarResult<()> {
    payload.data_freshness.validate()?;
    payload.investments.validate()
}

fn parse_payload(text: &str) -> RadarResult<ReportPayload> {
    let cleaned = clean_json_response(text);
    let json = if cleaned.is_empty() { "{}" } else { cleaned.as_str() };
    let payload: ReportPayload = serde_json::from_str(json)?;
    validate(&payload)?;
    Ok(payload)
}

pub fn into_report(
    reply: &GenerateContentResponse,
    generated_at: DateTime<Utc>,
) -> RadarResult<AnalysisReport> {
    let payload = parse_payload(&response_text(reply))?;

    Ok(AnalysisReport {
        id: uuid::Uuid::new_v4().to_string(),
        title: payload.title,
        summary: payload.summary,
        thought: extract_thought(reply),
        forces: payload.forces,
        inversion: payload.inversion,
        investments: payload.investments,
        sources: collect_sources(reply),
        timestamp: generated_at,
        data_freshness: payload.data_freshness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, RadarError};
    use crate::model::{fixtures, DrivingForce};
    use serde_json::{json, Value};

    fn payload_json() -> Value {
        let report = fixtures::report("x");
        json!({
            "title": "AI 晶片供應鏈重組",
            "summary": report.summary,
            "forces": report.forces,
            "inversion": report.inversion,
            "investments": report.investments,
            "dataFreshness": report.data_freshness,
        })
    }

    fn reply(parts: Value, chunks: Value) -> GenerateContentResponse {
        serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": parts },
                "groundingMetadata": { "groundingChunks": chunks }
            }]
        }))
        .unwrap()
    }

    fn text_reply(text: &str) -> GenerateContentResponse {
        reply(json!([{ "text": text }]), json!([]))
    }

    #[test]
    fn test_clean_json_response_strips_fences() {
        assert_eq!(clean_json_response("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(clean_json_response("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(clean_json_response("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_fenced_payload_becomes_report() {
        let text = format!("```json\n{}\n```", payload_json());
        let now = Utc::now();
        let report = into_report(&text_reply(&text), now).unwrap();

        assert_eq!(report.title, "AI 晶片供應鏈重組");
        assert_eq!(report.forces.iter().count(), 5);
        assert!((1..=10).contains(&report.data_freshness.score));
        assert_eq!(report.timestamp, now);
        assert!(!report.id.is_empty());
        assert_eq!(report.thought, "");
    }

    #[test]
    fn test_each_report_gets_a_fresh_id() {
        let text = payload_json().to_string();
        let a = into_report(&text_reply(&text), Utc::now()).unwrap();
        let b = into_report(&text_reply(&text), Utc::now()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_thought_parts_join_in_order() {
        let r = reply(
            json!([
                { "text": "first", "thought": true },
                { "text": payload_json().to_string() },
                { "text": "second", "thought": true }
            ]),
            json!([]),
        );
        assert_eq!(extract_thought(&r), "first\nsecond");
        let report = into_report(&r, Utc::now()).unwrap();
        assert_eq!(report.thought, "first\nsecond");
    }

    #[test]
    fn test_answer_text_skips_thoughts() {
        let r = reply(
            json!([
                { "text": "thinking", "thought": true },
                { "text": "{\"a\":" },
                { "text": "1}" }
            ]),
            json!([]),
        );
        assert_eq!(response_text(&r), "{\"a\":1}");
    }

    #[test]
    fn test_sources_default_title_and_drop_missing_uri() {
        let r = reply(
            json!([]),
            json!([
                { "web": { "uri": "https://a.example", "title": "A" } },
                { "web": { "uri": "https://b.example" } },
                { "web": { "title": "no link" } },
                { "web": { "uri": "", "title": "empty link" } },
                {}
            ]),
        );
        let sources = collect_sources(&r);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title.as_deref(), Some("A"));
        assert_eq!(sources[1].title.as_deref(), Some(DEFAULT_SOURCE_TITLE));
        assert_eq!(sources[1].uri.as_deref(), Some("https://b.example"));
    }

    #[test]
    fn test_only_empty_titles_fall_back() {
        let r = reply(
            json!([]),
            json!([
                { "web": { "uri": "https://a.example", "title": "" } },
                { "web": { "uri": "https://b.example", "title": " " } }
            ]),
        );
        let sources = collect_sources(&r);
        assert_eq!(sources[0].title.as_deref(), Some(DEFAULT_SOURCE_TITLE));
        assert_eq!(sources[1].title.as_deref(), Some(" "));
    }

    #[test]
    fn test_empty_reply_is_parse_error() {
        let empty = GenerateContentResponse::default();
        let err = into_report(&empty, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_non_json_is_parse_error() {
        let err = into_report(&text_reply("掃描失敗"), Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_score_out_of_range_is_rejected() {
        let mut payload = payload_json();
        payload["dataFreshness"]["score"] = json!(11);
        let err = into_report(&text_reply(&payload.to_string()), Utc::now()).unwrap_err();
        assert!(matches!(err, RadarError::Schema { ref field, .. } if field == "dataFreshness.score"));

        payload["dataFreshness"]["score"] = json!(0);
        assert!(into_report(&text_reply(&payload.to_string()), Utc::now()).is_err());
    }

    #[test]
    fn test_risk_level_out_of_range_is_rejected() {
        let mut payload = payload_json();
        payload["investments"]["taiwanStocks"][0]["riskLevel"] = json!(9);
        let err = into_report(&text_reply(&payload.to_string()), Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_unknown_correlated_force_is_rejected() {
        let mut payload = payload_json();
        payload["investments"]["taiwanStocks"][0]["correlatedForce"] = json!("氣候變遷");
        assert!(into_report(&text_reply(&payload.to_string()), Utc::now()).is_err());

        payload["investments"]["taiwanStocks"][0]["correlatedForce"] =
            json!(DrivingForce::Agency.label());
        assert!(into_report(&text_reply(&payload.to_string()), Utc::now()).is_ok());
    }

    #[test]
    fn test_missing_force_is_rejected() {
        let mut payload = payload_json();
        payload["forces"].as_object_mut().unwrap().remove("能源與物理約束");
        assert!(into_report(&text_reply(&payload.to_string()), Utc::now()).is_err());
    }
}
