//! Gemini-backed roster extraction.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::pdf::clean_row;
use super::{ImportError, RosterCandidate};
use crate::models::{Sex, Track};
use crate::remote::send_json;
use crate::utils::{blank_to_none, truncate_chars};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Longest roster text sent in one request
const MAX_INPUT_CHARS: usize = 12_000;

const PROMPT: &str = "You will receive raw text from a Sunday School roster. \
Extract members and return ONLY a JSON array (no code fences, no prose). Each item must have: \n\n\
name (string), gender (MALE or FEMALE), category (REGULAR, TEMPLE_PREP, or MISSION_PREP), \
optional email, optional phone. \n\n\
If category is unclear, default to REGULAR. If gender is unclear, infer from context or \
default to MALE. Keep the response minimal.";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect()
    }
}

/// Client for the Gemini `generateContent` endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask Gemini for the members in `text` and normalize its answer.
    pub async fn extract_members(&self, text: &str) -> Result<Vec<RosterCandidate>, ImportError> {
        let url = format!("{}/models/{}:generateContent", API_BASE_URL, self.model);
        let limited = truncate_chars(text, MAX_INPUT_CHARS);
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": PROMPT },
                    { "text": format!("Raw roster text:\n{}", limited) }
                ]
            }]
        });

        debug!(model = %self.model, chars = limited.chars().count(), "Sending roster to Gemini");
        let response: GenerateResponse = send_json("gemini", || {
            self.client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
        })
        .await?;

        let members = candidates_from_reply(&response.text())?;
        info!(count = members.len(), "Gemini extracted members");
        Ok(members)
    }
}

fn array_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("array pattern is valid"))
}

/// String form of a loosely-typed JSON field
fn field_text(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn normalize_item(item: &Value) -> Option<RosterCandidate> {
    let raw_name = field_text(item, "name");
    let raw_name = raw_name.trim();
    if raw_name.is_empty() {
        return None;
    }

    let gender = field_text(item, "gender").to_uppercase();
    let category = field_text(item, "category").to_uppercase();

    let mut sex = if gender.contains('F') {
        Sex::Female
    } else {
        Sex::Male
    };
    let track = if category.contains("TEMPLE") {
        Track::TemplePrep
    } else if category.contains("MISSION") {
        Track::MissionPrep
    } else {
        Track::Regular
    };

    // the model sometimes echoes whole roster lines as the name
    let row = clean_row(raw_name)?;
    if let Some(marker) = row.sex {
        sex = marker;
    }

    Some(RosterCandidate {
        name: row.name,
        sex,
        track,
        email: blank_to_none(Some(field_text(item, "email"))),
        phone: blank_to_none(Some(field_text(item, "phone"))),
    })
}

/// Find the JSON array in a model reply and turn its items into candidates.
pub fn candidates_from_reply(reply: &str) -> Result<Vec<RosterCandidate>, ImportError> {
    let array = array_pattern().find(reply).ok_or_else(|| {
        ImportError::MalformedReply("Gemini response did not contain a JSON array".to_string())
    })?;

    let items: Vec<Value> = serde_json::from_str(array.as_str()).map_err(|e| {
        ImportError::MalformedReply(format!("Failed to parse Gemini JSON response: {}", e))
    })?;

    let members: Vec<RosterCandidate> = items.iter().filter_map(normalize_item).collect();
    if members.is_empty() {
        return Err(ImportError::NothingFound);
    }
    Ok(members)
}
