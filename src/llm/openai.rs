//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）。请求与响应使用自定义结构（byot），
//! 以便在历史中原样携带工具调用与工具结果：
//! - assistant 的 ToolUse 块 → `tool_calls`
//! - user 消息中的 ToolResult 块 → 逐条 `role: tool` 消息（紧跟在对应 assistant 之后）
//! - 图片块 → `image_url` data URL

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::Client;
use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::llm::{
    CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, ToolSchema,
};
use crate::memory::{ContentBlock, Message, Role};

/// OpenAI 兼容客户端：持有 Client、model 名与单次请求超时
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(
        base_url: Option<&str>,
        model: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
    ) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = build_request_body(&self.model, request);
        let chat = self.client.chat();
        let call = chat.create_byot::<Value, WireResponse>(body);
        let response = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| LlmError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| classify_error(&e.to_string()))?;
        from_wire_response(response)
    }
}

/// 错误文本分类：限流单独识别，其余视为 API 错误
fn classify_error(message: &str) -> LlmError {
    let lower = message.to_lowercase();
    if lower.contains("rate limit") || lower.contains("429") {
        LlmError::RateLimited { retry_after_ms: 0 }
    } else {
        LlmError::Api(message.to_string())
    }
}

/// 组装 chat/completions 请求体
pub(crate) fn build_request_body(model: &str, request: &CompletionRequest) -> Value {
    let mut messages = vec![json!({ "role": "system", "content": request.system })];
    for msg in &request.messages {
        messages.extend(to_wire_messages(msg));
    }

    let mut body = json!({
        "model": model,
        "messages": messages,
        "max_tokens": request.max_tokens,
    });
    if !request.tools.is_empty() {
        body["tools"] = Value::Array(request.tools.iter().map(to_wire_tool).collect());
    }
    body
}

fn to_wire_tool(tool: &ToolSchema) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
        }
    })
}

/// 单条内部消息 → 一条或多条 wire 消息
pub(crate) fn to_wire_messages(msg: &Message) -> Vec<Value> {
    match msg.role {
        Role::Assistant => {
            let text = msg.text();
            let tool_calls: Vec<Value> = msg
                .tool_uses()
                .map(|(id, name, input)| {
                    json!({
                        "id": id,
                        "type": "function",
                        "function": { "name": name, "arguments": input.to_string() }
                    })
                })
                .collect();
            let mut out = json!({ "role": "assistant", "content": text });
            if !tool_calls.is_empty() {
                if text.is_empty() {
                    out["content"] = Value::Null;
                }
                out["tool_calls"] = Value::Array(tool_calls);
            }
            vec![out]
        }
        Role::User => {
            let mut out = Vec::new();
            let mut parts = Vec::new();
            for block in &msg.content {
                match block {
                    ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        ..
                    } => out.push(json!({
                        "role": "tool",
                        "tool_call_id": tool_use_id,
                        "content": content,
                    })),
                    ContentBlock::Text { text } => {
                        parts.push(json!({ "type": "text", "text": text }));
                    }
                    ContentBlock::Image { media_type, data } => {
                        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
                        parts.push(json!({
                            "type": "image_url",
                            "image_url": { "url": format!("data:{};base64,{}", media_type, encoded) }
                        }));
                    }
                    ContentBlock::ToolUse { .. } => {}
                }
            }
            if !parts.is_empty() {
                out.push(json!({ "role": "user", "content": parts }));
            }
            out
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    /// 纯文本回复时部分后端显式返回 `"tool_calls": null`
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

pub(crate) fn from_wire_response(response: WireResponse) -> Result<CompletionResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

    let mut content = Vec::new();
    if let Some(text) = choice.message.content.filter(|t| !t.trim().is_empty()) {
        content.push(ContentBlock::Text { text });
    }
    for call in choice.message.tool_calls.unwrap_or_default() {
        // 参数不是合法 JSON 时原样保留字符串，交由工具的参数校验报错
        let arguments = call.function.arguments.unwrap_or_default();
        let input = if arguments.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&arguments).unwrap_or(Value::String(arguments))
        };
        content.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    let stop_reason = match choice.finish_reason.as_deref() {
        Some("stop") | None => StopReason::EndTurn,
        Some("tool_calls") | Some("function_call") => StopReason::ToolUse,
        Some("length") => StopReason::MaxTokens,
        Some(other) => StopReason::Other(other.to_string()),
    };

    Ok(CompletionResponse {
        content,
        stop_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_results_become_tool_role_messages() {
        let msg = Message::new(
            Role::User,
            vec![
                ContentBlock::ToolResult {
                    tool_use_id: "call_1".into(),
                    content: "ok".into(),
                    is_error: false,
                },
                ContentBlock::ToolResult {
                    tool_use_id: "call_2".into(),
                    content: "failed".into(),
                    is_error: true,
                },
            ],
        );
        let wire = to_wire_messages(&msg);
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[0]["role"], "tool");
        assert_eq!(wire[1]["tool_call_id"], "call_2");
    }

    #[test]
    fn test_assistant_tool_use_becomes_tool_calls() {
        let msg = Message::new(
            Role::Assistant,
            vec![ContentBlock::ToolUse {
                id: "call_1".into(),
                name: "save_approval".into(),
                input: json!({"option": "a"}),
            }],
        );
        let wire = to_wire_messages(&msg);
        assert_eq!(wire.len(), 1);
        assert!(wire[0]["content"].is_null());
        assert_eq!(wire[0]["tool_calls"][0]["function"]["name"], "save_approval");
        let args = wire[0]["tool_calls"][0]["function"]["arguments"].as_str().unwrap();
        assert_eq!(serde_json::from_str::<Value>(args).unwrap()["option"], "a");
    }

    #[test]
    fn test_image_block_becomes_data_url() {
        let msg = Message::new(
            Role::User,
            vec![
                ContentBlock::image("image/jpeg", vec![1, 2, 3]),
                ContentBlock::text("make this pretty"),
            ],
        );
        let wire = to_wire_messages(&msg);
        assert_eq!(wire.len(), 1);
        let url = wire[0]["content"][0]["image_url"]["url"].as_str().unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_request_body_includes_system_and_tools() {
        let req = CompletionRequest {
            system: "be Sora".into(),
            messages: vec![Message::user("hi")],
            tools: vec![ToolSchema {
                name: "present_options".into(),
                description: "show buttons".into(),
                input_schema: json!({"type": "object"}),
            }],
            max_tokens: 2048,
        };
        let body = build_request_body("gpt-4o", &req);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["tools"][0]["function"]["name"], "present_options");
        assert_eq!(body["max_tokens"], 2048);
    }

    #[test]
    fn test_wire_response_with_tool_calls() {
        let raw = json!({
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "generate_image", "arguments": "{\"prompt\":\"sunrise\"}"}
                    }]
                }
            }]
        });
        let resp = from_wire_response(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(resp.stop_reason, StopReason::ToolUse);
        assert_eq!(resp.content.len(), 1);
        match &resp.content[0] {
            ContentBlock::ToolUse { id, input, .. } => {
                assert_eq!(id, "call_9");
                assert_eq!(input["prompt"], "sunrise");
            }
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[test]
    fn test_null_tool_calls_is_plain_reply() {
        let msg: WireMessage =
            serde_json::from_str(r#"{"content":"Hello!","tool_calls":null}"#).unwrap();
        assert!(msg.tool_calls.is_none());

        let raw = json!({
            "choices": [{
                "finish_reason": "stop",
                "message": {"role": "assistant", "content": "Hello!", "tool_calls": null}
            }]
        });
        let resp = from_wire_response(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(resp.stop_reason, StopReason::EndTurn);
        assert_eq!(resp.content, vec![ContentBlock::text("Hello!")]);
    }

    #[test]
    fn test_null_arguments_become_empty_object() {
        let raw = json!({
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "tool_calls": [{
                        "id": "call_3",
                        "type": "function",
                        "function": {"name": "apply_brand_filter", "arguments": null}
                    }]
                }
            }]
        });
        let resp = from_wire_response(serde_json::from_value(raw).unwrap()).unwrap();
        assert!(matches!(&resp.content[0], ContentBlock::ToolUse { input, .. } if *input == json!({})));
    }

    #[test]
    fn test_empty_choices_is_invalid() {
        let resp = from_wire_response(WireResponse { choices: vec![] });
        assert!(matches!(resp, Err(LlmError::InvalidResponse(_))));
    }
}
