use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::config::LlmConfig;
use crate::llm::{ChatMessage, NarrativeBackend, NarrativePrompt};

type ChatStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Narrative backend over an Ollama or OpenAI-compatible chat API.
///
/// Responses are streamed and the content deltas collected into one narrative.
pub struct ChatBackend {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ChatBackend {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl NarrativeBackend for ChatBackend {
    fn name(&self) -> &str {
        &self.config.provider
    }

    async fn generate_narrative(&self, prompt: &NarrativePrompt) -> Result<String> {
        let stream = stream_chat(&self.client, &self.config, prompt.messages()).await?;
        collect_deltas(stream).await
    }
}

/// Concatenate every delta; the first stream error aborts the generation.
async fn collect_deltas(mut stream: ChatStream) -> Result<String> {
    let mut narrative = String::new();
    while let Some(delta) = stream.next().await {
        narrative.push_str(&delta?);
    }
    Ok(narrative)
}

/// Stream chat completions from Ollama or OpenAI.
/// Returns a stream of content delta strings (one per token/chunk).
async fn stream_chat(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
) -> Result<ChatStream> {
    match config.provider.as_str() {
        "ollama" => stream_ollama(client, config, messages).await,
        "openai" => stream_openai(client, config, messages).await,
        other => anyhow::bail!("Unsupported LLM provider for chat: {other}"),
    }
}

#[derive(Serialize, Deserialize)]
struct StreamMessage {
    role: String,
    content: String,
}

fn to_stream_messages(messages: Vec<ChatMessage>) -> Vec<StreamMessage> {
    messages
        .into_iter()
        .map(|m| StreamMessage {
            role: m.role,
            content: m.content,
        })
        .collect()
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<StreamMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaStreamChunk {
    message: StreamMessage,
    done: bool,
}

async fn stream_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
) -> Result<ChatStream> {
    let url = format!("{}/api/chat", config.base_url.trim_end_matches('/'));

    let req = OllamaChatRequest {
        model: config.chat_model.clone(),
        messages: to_stream_messages(messages),
        stream: true,
        options: OllamaOptions { temperature: 0.2 },
    };

    let resp = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .context("Failed to connect to Ollama for narrative generation")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let stream = stream_lines(resp.bytes_stream()).filter_map(|line_result| async move {
        match line_result {
            Ok(line) => parse_ollama_line(&line),
            Err(e) => Some(Err(e)),
        }
    });

    Ok(Box::pin(stream))
}

/// Parse a single Ollama streaming line. Returns:
/// - Some(Ok(content)) for content deltas
/// - Some(Err(e)) for parse errors
/// - None to skip (empty content or done signal)
fn parse_ollama_line(line: &str) -> Option<Result<String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<OllamaStreamChunk>(line) {
        Ok(chunk) if chunk.done || chunk.message.content.is_empty() => None,
        Ok(chunk) => Some(Ok(chunk.message.content)),
        Err(e) => Some(Err(anyhow::anyhow!("Failed to parse Ollama chunk: {e}"))),
    }
}

// ─── OpenAI ──────────────────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<StreamMessage>,
    stream: bool,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiStreamDelta,
}

#[derive(Deserialize)]
struct OpenAiStreamDelta {
    content: Option<String>,
}

async fn stream_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<ChatMessage>,
) -> Result<ChatStream> {
    let url = format!(
        "{}/v1/chat/completions",
        config.base_url.trim_end_matches('/')
    );

    let req = OpenAiChatRequest {
        model: config.chat_model.clone(),
        messages: to_stream_messages(messages),
        stream: true,
        temperature: 0.2,
    };

    let resp = client
        .post(&url)
        .header(
            "Authorization",
            format!("Bearer {}", config.api_key.as_deref().unwrap_or("")),
        )
        .json(&req)
        .send()
        .await
        .context("Failed to connect to OpenAI for narrative generation")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let stream = stream_lines(resp.bytes_stream()).filter_map(|line_result| async move {
        match line_result {
            Ok(line) => parse_openai_line(&line),
            Err(e) => Some(Err(e)),
        }
    });

    Ok(Box::pin(stream))
}

/// Parse a single OpenAI SSE line. `None` skips blank lines, `[DONE]`,
/// non-data lines and role-only chunks.
fn parse_openai_line(line: &str) -> Option<Result<String>> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<OpenAiStreamChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|content| !content.is_empty())
            .map(Ok),
        Err(e) => Some(Err(anyhow::anyhow!("Failed to parse OpenAI chunk: {e}"))),
    }
}

// ─── Line buffering ──────────────────────────────────────

/// Convert a byte stream into a stream of complete, non-blank lines.
///
/// Bytes are buffered until a newline so multi-byte characters split across
/// network chunks are decoded intact.
fn stream_lines<E>(
    byte_stream: impl Stream<Item = std::result::Result<bytes::Bytes, E>> + Send + 'static,
) -> impl Stream<Item = Result<String>> + Send
where
    E: std::fmt::Display + Send + 'static,
{
    futures_util::stream::unfold(
        (Box::pin(byte_stream), Vec::<u8>::new(), false),
        |(mut stream, mut buffer, finished)| async move {
            loop {
                if let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                    let line = String::from_utf8_lossy(&line).trim_end().to_string();
                    if !line.trim().is_empty() {
                        return Some((Ok(line), (stream, buffer, finished)));
                    }
                    continue;
                }

                if finished {
                    return None;
                }

                match stream.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        return Some((
                            Err(anyhow::anyhow!("Stream read error: {e}")),
                            (stream, buffer, true),
                        ));
                    }
                    None => {
                        let remaining = String::from_utf8_lossy(&buffer).trim().to_string();
                        buffer.clear();
                        if remaining.is_empty() {
                            return None;
                        }
                        return Some((Ok(remaining), (stream, buffer, true)));
                    }
                }
            }
        },
    )
}
