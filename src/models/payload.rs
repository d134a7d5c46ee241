//! 响应结果模型
//!
//! 只接受扁平的键值对象：值必须是字符串、数字、布尔或 null

use serde_json::{Number, Value as JsonValue};

/// 扁平映射中的一个标量值
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl FlatValue {
    /// 嵌套的对象或数组返回 None
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => Some(FlatValue::Null),
            JsonValue::Bool(b) => Some(FlatValue::Bool(*b)),
            JsonValue::Number(n) => Some(FlatValue::Number(n.clone())),
            JsonValue::String(s) => Some(FlatValue::String(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    /// 展示用文本：null 显示为 "null"，字符串原样输出
    pub fn render(&self) -> String {
        match self {
            FlatValue::Null => "null".to_string(),
            FlatValue::Bool(b) => b.to_string(),
            FlatValue::Number(n) => canonical_number(n),
            FlatValue::String(s) => s.clone(),
        }
    }
}

/// 整数值的浮点数不带小数部分（`2.0` → `"2"`）
fn canonical_number(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f == 0.0 {
                return "0".to_string();
            }
            if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 {
                return format!("{:.0}", f);
            }
        }
    }
    n.to_string()
}

/// 成功响应的扁平键值映射，保持响应体中的键顺序
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultPayload {
    entries: Vec<(String, FlatValue)>,
}

impl ResultPayload {
    /// 不是对象、或任一值为对象/数组时返回 None
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;
        let entries = object
            .iter()
            .map(|(key, value)| FlatValue::from_json(value).map(|v| (key.clone(), v)))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&FlatValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlatValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_object_keeps_key_order() {
        let payload = ResultPayload::from_json(&json!({"b": 1, "a": "x", "c": null})).unwrap();
        let keys: Vec<&str> = payload.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_integer_like_keys_keep_body_order() {
        let value: JsonValue = serde_json::from_str(r#"{"b": 1, "2": "x", "1": true}"#).unwrap();
        let payload = ResultPayload::from_json(&value).unwrap();
        let keys: Vec<&str> = payload.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "2", "1"]);
    }

    #[test]
    fn test_nested_values_are_rejected() {
        assert!(ResultPayload::from_json(&json!({"a": {"b": 1}})).is_none());
        assert!(ResultPayload::from_json(&json!({"a": [1, 2]})).is_none());
        assert!(ResultPayload::from_json(&json!([1, 2])).is_none());
        assert!(ResultPayload::from_json(&json!("text")).is_none());
        assert!(ResultPayload::from_json(&JsonValue::Null).is_none());
    }

    #[test]
    fn test_empty_object_is_flat() {
        let payload = ResultPayload::from_json(&json!({})).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_render_values() {
        let payload = ResultPayload::from_json(&json!({
            "s": "x",
            "i": 2,
            "f": 2.5,
            "whole": 3.0,
            "t": true,
            "n": null
        }))
        .unwrap();

        assert_eq!(payload.get("s").unwrap().render(), "x");
        assert_eq!(payload.get("i").unwrap().render(), "2");
        assert_eq!(payload.get("f").unwrap().render(), "2.5");
        assert_eq!(payload.get("whole").unwrap().render(), "3");
        assert_eq!(payload.get("t").unwrap().render(), "true");
        assert_eq!(payload.get("n").unwrap().render(), "null");
    }
}
