use super::Summarizer;
use crate::config::MistralConfig;
use crate::error::{HomeGrownError, Result};
use crate::models::RecommendationReport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const SOURCE_NAME: &str = "Mistral";
const TOP_CROPS: usize = 5;

const SYSTEM_PROMPT: &str = "You advise urban planners on which crops a parcel of city land can grow. \
Write in a professional, friendly tone using markdown. Keep it to about 100 words with no section headers. \
Open with the climate in words rather than numbers and mention the parcel size. \
List the 3-4 best crops as bullets with an emoji for the crop, the **crop name** in bold, its suitability score and expected yield. \
Add one key consideration such as irrigation, shading or crops excluded for lack of sun, then close with one practical recommendation. \
Only use emojis for crops.";

pub struct MistralSummarizer {
    client: reqwest::Client,
    config: MistralConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl MistralSummarizer {
    pub fn new(config: MistralConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Summarizer for MistralSummarizer {
    async fn summarize(&self, report: &RecommendationReport) -> Result<String> {
        if !self.config.is_usable() {
            return Err(HomeGrownError::Config("Mistral API key not configured".into()));
        }

        let digest = report_digest(report);
        let user_prompt = format!(
            "Summarize this crop recommendation analysis.\n\nDATA:\n{}",
            serde_json::to_string_pretty(&digest)?
        );

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| HomeGrownError::DataSourceUnavailable(format!("{}: {}", SOURCE_NAME, e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(HomeGrownError::RateLimited(SOURCE_NAME.into()));
        }
        if !status.is_success() {
            return Err(HomeGrownError::Upstream {
                source_name: SOURCE_NAME.into(),
                status: status.as_u16(),
                message: "chat completion failed".into(),
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            HomeGrownError::InvalidData(format!("Failed to parse {} response: {}", SOURCE_NAME, e))
        })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| HomeGrownError::InvalidData(format!("{} returned no text", SOURCE_NAME)))
    }
}

/// Compact view of a report for the prompt: location, climate, counts and
/// the best few crops.
pub fn report_digest(report: &RecommendationReport) -> Value {
    let top: Vec<Value> = report
        .recommendations
        .iter()
        .take(TOP_CROPS)
        .map(|rec| {
            let s = &rec.suitability;
            json!({
                "name": rec.crop_name,
                "overall_score": s.overall_score,
                "category": s.category.as_str(),
                "scores": s.scores,
                "growing_days": s.metrics.growing_days,
                "adjusted_sun_hours": s.metrics.adjusted_sun_hours,
                "irrigation_needed_mm": s.metrics.irrigation_needed_mm,
                "yield": s.yield_estimate.as_ref().map(|y| json!({
                    "per_m2_kg": y.yield_per_m2_kg,
                    "total_kg": y.total_yield_kg,
                    "category": y.yield_category_label,
                })),
            })
        })
        .collect();

    json!({
        "location": {
            "area_m2": report.location.area_m2,
            "area_hectares": report.location.area_hectares,
            "coordinates": {
                "lat": report.location.center_latitude,
                "lon": report.location.center_longitude,
            },
        },
        "climate": {
            "avg_temp_max": report.climate_summary.avg_temp_max,
            "avg_temp_min": report.climate_summary.avg_temp_min,
            "annual_precipitation_mm": report.climate_summary.annual_precipitation_mm,
            "sunshine_hours": report.climate_summary.adjusted_sun_hours_daily,
        },
        "sunshine_factor": report.sunshine_factor,
        "statistics": {
            "total_suitable_crops": report.total_suitable_crops,
            "filtered_by_sunlight": report.total_filtered_by_sunlight,
        },
        "top_recommendations": top,
    })
}
