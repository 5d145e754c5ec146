use crate::engine::error::CallError;
use crate::engine::object::{Function, MemberTable, Object};
use std::cell::RefCell;
use std::fmt;

/// メソッド・アドバイス呼び出しの戻り値
pub type CallResult = Result<Value, CallError>;

// ========================================
// 動的な値
// ========================================

/// オブジェクトグラフ上を流れる値
///
/// `Function` と `Object` はハンドルなので、クローンしても同じ実体を指す。
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Function(Function),
    Object(Object),
}

impl Value {
    /// 型名（エラーメッセージ用）
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Object(_) => "object",
        }
    }

    #[inline]
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// メソッド本体から `this` をオブジェクトとして取り出す
    pub fn receiver(&self) -> Result<&Object, CallError> {
        self.as_object()
            .ok_or_else(|| CallError::NotAnObject(self.type_name()))
    }

    /// JSON表現へ変換（関数は出力しない、循環参照は null）
    pub fn to_json(&self) -> serde_json::Value {
        let mut seen = Vec::new();
        self.to_json_inner(&mut seen)
    }

    fn to_json_inner(&self, seen: &mut Vec<*const RefCell<MemberTable>>) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json_inner(seen)).collect())
            }
            Value::Object(object) => {
                let ptr = object.identity();
                if seen.contains(&ptr) {
                    return serde_json::Value::Null;
                }
                seen.push(ptr);
                let mut map = serde_json::Map::new();
                for (key, value) in object.own_entries() {
                    // JSON.stringify と同様、関数と undefined は省く
                    if value.is_callable() || matches!(value, Value::Undefined) {
                        continue;
                    }
                    map.insert(key, value.to_json_inner(seen));
                }
                seen.pop();
                serde_json::Value::Object(map)
            }
        }
    }

    /// JSON文字列へ変換
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

#[inline]
fn number_to_json(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// 関数・オブジェクトは同一性、それ以外は値で比較する
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Function::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Object::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Object(_) => write!(f, "Object({})", self.to_json_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_json(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            Value::Function(func) => write!(f, "[Function: {}]", func.name()),
            Value::Object(_) => write!(f, "{}", self.to_json_string()),
        }
    }
}

// ========================================
// Rust型 → Value
// ========================================

macro_rules! impl_from_number {
    ($($T:ty),+) => {
        $(
            impl From<$T> for Value {
                fn from(n: $T) -> Self {
                    Value::Number(n as f64)
                }
            }
        )+
    };
}

impl_from_number!(f64, f32, i32, i64, u32, u64, usize);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

// ========================================
// Value → Rust型
// ========================================

/// Valueから各型への変換トレイト
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

macro_rules! impl_from_value_number {
    ($($T:ty),+) => {
        $(
            impl FromValue for $T {
                fn from_value(value: &Value) -> Option<Self> {
                    value.as_number().map(|n| n as $T)
                }
            }
        )+
    };
}

impl_from_value_number!(f64, f32, i32, i64, u32, u64, usize);

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

// null / undefined は None、それ以外は中身の変換結果
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        if value.is_nullish() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl FromValue for Function {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_function().cloned()
    }
}

impl FromValue for Object {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }
}

/// 引数リストから位置指定で取り出して変換する
pub fn arg<T: FromValue>(args: &[Value], index: usize) -> Result<T, CallError> {
    let value = args.get(index).cloned().unwrap_or_default();
    T::from_value(&value).ok_or_else(|| {
        CallError::Thrown(format!(
            "argument {} has unexpected type {}",
            index + 1,
            value.type_name()
        ))
    })
}
