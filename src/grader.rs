use std::sync::LazyLock;

use anyhow::Context;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::classify::PageType;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f64 = 0.2;

/// Failures inside the grading client. These never cross the trait
/// boundary: they are folded into an error-rationale [`GradeScores`].
#[derive(Debug, Error)]
pub enum GraderError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("grader service returned status {0}")]
    Status(u16),
    #[error("malformed grader response: {0}")]
    Malformed(String),
}

/// The four 0-10 sub-scores plus the grader's rationale for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeScores {
    pub vocabulary_complexity: i64,
    pub grammatical_structures: i64,
    pub overall_clarity: i64,
    pub coherence: i64,
    pub rationale: String,
}

impl GradeScores {
    /// All-zero scores with an explanatory rationale; the shape every
    /// absorbed failure takes.
    pub fn error(msg: &str) -> Self {
        Self {
            vocabulary_complexity: 0,
            grammatical_structures: 0,
            overall_clarity: 0,
            coherence: 0,
            rationale: format!("Error: {msg}"),
        }
    }

    pub fn sub_scores(&self) -> [i64; 4] {
        [
            self.vocabulary_complexity,
            self.grammatical_structures,
            self.overall_clarity,
            self.coherence,
        ]
    }
}

/// 0-100 compliance level: mean of the sub-scores scaled by 10, but only
/// when every sub-score is a valid 0-10 value. Any out-of-range score
/// zeroes the page's compliance outright. Ties (odd sub-score sums land
/// on .5) round half to even, keeping levels stable against historical
/// checkpoints.
pub fn compliance_level(scores: &GradeScores) -> i64 {
    let subs = scores.sub_scores();
    if !subs.iter().all(|s| (0..=10).contains(s)) {
        return 0;
    }
    // mean * 10 == sum * 5 / 2, exact in integers apart from the .5 tie
    let fives = subs.iter().sum::<i64>() * 5;
    let level = fives / 2;
    if fives % 2 == 0 || level % 2 == 0 {
        level
    } else {
        level + 1
    }
}

/// External language-quality oracle. Implementations must absorb their own
/// failures: `grade` always produces scores, never an error.
#[async_trait]
pub trait Grader: Send + Sync {
    async fn grade(&self, text: &str, page_type: PageType) -> GradeScores;
}

// ── LLM-backed implementation ──

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Grader over an OpenAI-compatible chat-completions endpoint.
pub struct LlmGrader {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmGrader {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    /// Configure from `GRADER_API_KEY` (required), `GRADER_BASE_URL` and
    /// `GRADER_MODEL` (optional).
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("GRADER_API_KEY")
            .context("GRADER_API_KEY environment variable must be set")?;
        let base_url =
            std::env::var("GRADER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GRADER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(api_key, base_url, model))
    }

    async fn request(&self, prompt: String) -> Result<String, GraderError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: TEMPERATURE,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GraderError::Status(status.as_u16()));
        }

        let parsed: ChatResponse = resp.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GraderError::Malformed("no choices in response".to_string()))?;
        Ok(content)
    }
}

#[async_trait]
impl Grader for LlmGrader {
    async fn grade(&self, text: &str, page_type: PageType) -> GradeScores {
        let prompt = build_prompt(text, page_type);
        match self.request(prompt).await {
            Ok(output) => {
                debug!(len = output.len(), "grader response received");
                parse_scores(&output)
            }
            Err(e) => GradeScores::error(&e.to_string()),
        }
    }
}

fn build_prompt(text: &str, page_type: PageType) -> String {
    format!(
        "You assess whether retail-banking webpage content is written at CEFR B2 \
         level or simpler, in English, French or Dutch. Banking terminology that is \
         inherent to the subject should not be penalized by itself.\n\n\
         Page type: {page_type}\n\n\
         Rate each aspect on a 0-10 integer scale (10 = simplest / clearest, \
         0 = far beyond B2). Use the full scale; the B2 compliance threshold is 7.\n\
         - vocabulary_complexity: common words vs unexplained jargon\n\
         - grammatical_structures: simple active sentences vs embedded or passive forms\n\
         - overall_clarity: how easily a B2 reader follows the text\n\
         - coherence: logical flow, organization, connectors\n\n\
         Give a single-line rationale covering all four aspects, separated by \"; \".\n\n\
         Return exactly this XML, nothing else:\n\
         <vocabulary_complexity>N</vocabulary_complexity>\n\
         <grammatical_structures>N</grammatical_structures>\n\
         <overall_clarity>N</overall_clarity>\n\
         <coherence>N</coherence>\n\
         <rationale>Vocabulary: ...; Grammar: ...; Clarity: ...; Coherence: ...</rationale>\n\n\
         Text to assess:\n\"\"\"{text}\"\"\""
    )
}

static VOCABULARY_RE: LazyLock<Regex> = LazyLock::new(|| tag_re("vocabulary_complexity"));
static GRAMMAR_RE: LazyLock<Regex> = LazyLock::new(|| tag_re("grammatical_structures"));
static CLARITY_RE: LazyLock<Regex> = LazyLock::new(|| tag_re("overall_clarity"));
static COHERENCE_RE: LazyLock<Regex> = LazyLock::new(|| tag_re("coherence"));
static RATIONALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"<rationale>(.*?)</rationale>")
        .dot_matches_new_line(true)
        .build()
        .unwrap()
});

fn tag_re(tag: &str) -> Regex {
    Regex::new(&format!(r"<{tag}>(\d+)</{tag}>")).unwrap()
}

/// Parse the oracle's tagged response. Partial responses degrade
/// gracefully: a missing sub-score is 0, a missing rationale gets a
/// fixed placeholder.
pub fn parse_scores(output: &str) -> GradeScores {
    let output = strip_fence(output);
    GradeScores {
        vocabulary_complexity: tag_value(&VOCABULARY_RE, output),
        grammatical_structures: tag_value(&GRAMMAR_RE, output),
        overall_clarity: tag_value(&CLARITY_RE, output),
        coherence: tag_value(&COHERENCE_RE, output),
        rationale: RATIONALE_RE
            .captures(output)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_else(|| "No rationale found.".to_string()),
    }
}

fn tag_value(re: &Regex, text: &str) -> i64 {
    re.captures(text)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}

/// Strip an optional ``` fence (with or without an `xml` tag) around the
/// response body.
fn strip_fence(output: &str) -> &str {
    let trimmed = output.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("xml").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
