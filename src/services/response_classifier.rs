//! 响应分类服务 - 业务能力层
//!
//! 把一次 HTTP 交换的结果归类为成功载荷或某种提交错误。
//! 判断顺序固定：读取失败 → 空响应体 → 非法 JSON → 非 2xx 状态 → 非扁平结构 → 成功。

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::clients::webhook_client::TransportResponse;
use crate::error::SubmitError;
use crate::models::ResultPayload;

/// 对已经拿到的响应进行分类
pub fn classify_response(response: TransportResponse) -> Result<ResultPayload, SubmitError> {
    let TransportResponse {
        status,
        status_text,
        body,
    } = response;

    let raw_text = match body {
        Ok(text) => text,
        Err(reason) => {
            debug!("读取响应体失败: {}", reason);
            return Err(SubmitError::ResponseRead {
                status,
                status_text,
            });
        }
    };

    if raw_text.is_empty() {
        return Err(SubmitError::EmptyBody {
            status,
            status_text,
        });
    }

    let parsed: JsonValue = match serde_json::from_str(&raw_text) {
        Ok(value) => value,
        Err(source) => {
            return Err(SubmitError::MalformedJson {
                status,
                status_text,
                source,
            })
        }
    };

    if !(200..300).contains(&status) {
        return Err(SubmitError::Server {
            message: extract_error_message(&parsed, status),
            status,
            status_text,
        });
    }

    ResultPayload::from_json(&parsed).ok_or(SubmitError::Shape {
        status,
        status_text,
    })
}

/// 从错误响应体中取出 `error` 或 `message` 字段，都没有时按状态码生成
pub fn extract_error_message(body: &JsonValue, status: u16) -> String {
    ["error", "message"]
        .iter()
        .filter_map(|key| body.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}.", status))
}
