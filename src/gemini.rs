use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::{ArticleConfig, GeminiConfig};
use crate::error::{RadarError, RadarResult};
use crate::model::AnalysisReport;
use crate::normalize;
use crate::prompts;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<TextPart>,
}

impl Content {
    fn user(text: String) -> Self {
        Content {
            role: Some("user".to_string()),
            parts: vec![TextPart { text }],
        }
    }

    fn system(text: &str) -> Self {
        Content {
            role: None,
            parts: vec![TextPart { text: text.to_string() }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
    pub include_thoughts: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    /// Set on parts that carry the model's reasoning rather than its answer.
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebChunk {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: Option<String>,
    analysis_model: String,
    article_model: String,
    thinking_budget: u32,
    search_grounding: bool,
    article: ArticleConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn with_config(gemini: &GeminiConfig, article: &ArticleConfig) -> RadarResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = gemini.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(GeminiClient {
            base_url: gemini.base_url.trim_end_matches('/').to_string(),
            api_key: gemini.resolve_api_key(),
            analysis_model: gemini.analysis_model.clone(),
            article_model: gemini.article_model.clone(),
            thinking_budget: gemini.thinking_budget,
            search_grounding: gemini.search_grounding,
            article: article.clone(),
            client: builder.build()?,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn build_analysis_request(&self, query: &str, today: NaiveDate) -> GenerateContentRequest {
        let tools = if self.search_grounding {
            vec![json!({ "googleSearch": {} })]
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            contents: vec![Content::user(prompts::analysis_contents(query, today))],
            system_instruction: Some(Content::system(prompts::SYSTEM_INSTRUCTION)),
            tools,
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(prompts::report_schema()),
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: self.thinking_budget,
                    include_thoughts: true,
                }),
                ..GenerationConfig::default()
            },
        }
    }

    pub fn build_article_request(&self, report: &AnalysisReport) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(prompts::article_prompt(report, self.article.min_chars))],
            system_instruction: None,
            tools: Vec::new(),
            generation_config: GenerationConfig {
                temperature: Some(self.article.temperature),
                top_p: Some(self.article.top_p),
                top_k: Some(self.article.top_k),
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: self.thinking_budget,
                    include_thoughts: false,
                }),
                ..GenerationConfig::default()
            },
        }
    }

    /// Run one analysis scan. Blank queries never reach this point.
    pub async fn analyze(&self, query: &str) -> RadarResult<AnalysisReport> {
        let request = self.build_analysis_request(query, Local::now().date_naive());
        let reply = self.generate(&self.analysis_model, &request).await?;
        let report = normalize::into_report(&reply, Utc::now())?;
        eprintln!(
            "[Gemini] Analysis ready: \"{}\" ({} sources, freshness {}/10)",
            report.title,
            report.sources.len(),
            report.data_freshness.score
        );
        Ok(report)
    }

    pub async fn generate_article(&self, report: &AnalysisReport) -> RadarResult<String> {
        let request = self.build_article_request(report);
        let reply = self.generate(&self.article_model, &request).await?;
        let text = normalize::response_text(&reply);
        if text.trim().is_empty() {
            return Err(RadarError::EmptyReply);
        }
        Ok(text)
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> RadarResult<GenerateContentResponse> {
        let api_key = self.api_key.as_deref().ok_or(RadarError::MissingApiKey)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        debug_eprintln!("[Gemini] POST {}", url);
        if std::env::var("TREND_RADAR_DEBUG").is_ok() {
            if let Ok(body) = serde_json::to_string_pretty(request) {
                eprintln!("[Gemini] Request body:\n{}", body);
            }
        }

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            eprintln!("[Gemini] {} returned {}: {}", model, status, message);
            return Err(RadarError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
