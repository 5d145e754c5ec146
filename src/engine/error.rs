use thiserror::Error;

// ========================================
// 登録時エラー
// ========================================

/// アドバイス登録・イントロダクション時に発生するエラー
///
/// 登録処理の呼び出し元へ同期的にそのまま返される。
/// 呼び出し時（メソッド実行時）のエラーは [`CallError`] を参照。
#[derive(Debug, Error)]
pub enum AspectError {
    #[error("target must be an object or a function, got {0}")]
    InvalidTarget(&'static str),

    #[error("introduction must be a function, got {0}")]
    InvalidIntroduction(&'static str),

    #[error("aspect must be a function, got {0}")]
    AspectType(&'static str),

    #[error("no matching method found for selector {0}")]
    NoMatch(String),

    #[error("must never apply 'around' after 'before' or 'after' has been applied")]
    Ordering,

    /// 選択済みの名前に元メソッドが見つからない（内部不変条件の違反）
    #[error("missing valid method by the name: {0}")]
    MissingMethod(String),

    #[error("invalid method pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid aspect options: {0}")]
    Options(#[from] serde_json::Error),
}

pub type AspectResult<T> = Result<T, AspectError>;

// ========================================
// 呼び出し時エラー
// ========================================

/// メソッド・アドバイス本体の実行時エラー
///
/// ラッパーはこのエラーに手を加えず、元の呼び出し位置までそのまま伝播させる。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    #[error("{0} is not a function")]
    NotCallable(String),

    #[error("no method named '{0}'")]
    NoSuchMethod(String),

    #[error("receiver must be an object, got {0}")]
    NotAnObject(&'static str),

    #[error("{0}")]
    Thrown(String),

    #[error("slot error: {0}")]
    Slot(String),
}

impl From<String> for CallError {
    fn from(message: String) -> Self {
        CallError::Thrown(message)
    }
}

impl From<&str> for CallError {
    fn from(message: &str) -> Self {
        CallError::Thrown(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AspectError::InvalidTarget("number");
        assert_eq!(err.to_string(), "target must be an object or a function, got number");

        let err = AspectError::MissingMethod("view".to_string());
        assert_eq!(err.to_string(), "missing valid method by the name: view");
    }

    #[test]
    fn test_call_error_from_str() {
        let err: CallError = "boom".into();
        assert_eq!(err, CallError::Thrown("boom".to_string()));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_call_error_messages_cover_every_variant() {
        // 変種を追加したらここの match も更新すること（ワイルドカードなし）
        fn describe(err: &CallError) -> &'static str {
            match err {
                CallError::NotCallable(_) => "not callable",
                CallError::NoSuchMethod(_) => "no such method",
                CallError::NotAnObject(_) => "not an object",
                CallError::Thrown(_) => "thrown",
                CallError::Slot(_) => "slot",
            }
        }

        let cases = [
            (CallError::NotCallable("x".to_string()), "x is not a function"),
            (CallError::NoSuchMethod("run".to_string()), "no method named 'run'"),
            (CallError::NotAnObject("number"), "receiver must be an object, got number"),
            (CallError::Thrown("boom".to_string()), "boom"),
            (CallError::Slot("bad".to_string()), "slot error: bad"),
        ];
        for (err, message) in &cases {
            assert_eq!(err.to_string(), *message, "{}", describe(err));
        }
    }

    #[test]
    fn test_pattern_error_conversion() {
        let regex_err = regex::Regex::new("(").unwrap_err();
        let err = AspectError::from(regex_err);
        assert!(matches!(err, AspectError::InvalidPattern(_)));
    }
}
