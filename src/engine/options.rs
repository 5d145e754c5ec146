use crate::engine::error::AspectResult;
use serde::{Deserialize, Serialize};

/// アドバイス適用時のオプション
///
/// JSON では `{"strict": true}` の形で指定する（省略時は false）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AspectOptions {
    /// true の場合、一致するメソッドが無ければ NoMatch エラー
    pub strict: bool,
}

impl AspectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn from_json(source: &str) -> AspectResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_json(&self) -> AspectResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::AspectError;

    #[test]
    fn test_default_is_lenient() {
        assert!(!AspectOptions::default().strict);
        assert_eq!(AspectOptions::from_json("{}").unwrap(), AspectOptions::default());
    }

    #[test]
    fn test_from_json() {
        let options = AspectOptions::from_json(r#"{"strict": true}"#).unwrap();
        assert!(options.strict);
        assert_eq!(options.to_json().unwrap(), r#"{"strict":true}"#);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = AspectOptions::from_json(r#"{"strict": "yes"}"#).unwrap_err();
        assert!(matches!(err, AspectError::Options(_)));
    }
}
