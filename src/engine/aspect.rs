use crate::engine::error::{AspectError, AspectResult};
use crate::engine::object::{Function, Surface};
use crate::engine::options::AspectOptions;
use crate::engine::selector::Selector;
use crate::engine::value::{CallResult, Value};
use log::{debug, warn};
use std::fmt;
use std::rc::Rc;

/// around アドバイスの型（元メソッドの呼び出し権を明示的に受け取る）
pub type AroundFn = dyn Fn(&Value, &[Value], &Proceed<'_>) -> CallResult;

/// around アドバイスに渡される「元メソッドを今呼ぶ」権限
pub struct Proceed<'a> {
    original: &'a Function,
    this: &'a Value,
    args: &'a [Value],
}

impl<'a> Proceed<'a> {
    /// 元メソッドを現在の `this` と引数で呼び出す
    pub fn call(&self) -> CallResult {
        self.original.call(self.this, self.args)
    }

    /// 引数を差し替えて元メソッドを呼び出す
    pub fn call_with(&self, args: &[Value]) -> CallResult {
        self.original.call(self.this, args)
    }

    pub fn original(&self) -> &Function {
        self.original
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdviceKind {
    Before,
    After,
    Around,
}

impl fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdviceKind::Before => write!(f, "before"),
            AdviceKind::After => write!(f, "after"),
            AdviceKind::Around => write!(f, "around"),
        }
    }
}

// ========================================
// アドバイスエンジン
// ========================================

/// 既存のオブジェクト・コンストラクタへアドバイスとメソッドを織り込む
#[derive(Debug, Clone, Default)]
pub struct Aspect {
    options: AspectOptions,
}

impl Aspect {
    pub fn new() -> Self {
        Self::default()
    }

    /// `options` を省略した呼び出しで使う既定値を指定
    pub fn with_options(options: AspectOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AspectOptions {
        &self.options
    }

    /// `introduction` のプロトタイプの全メンバーを `target` へコピーする
    ///
    /// 同名のメンバーは警告なしに上書きされる。
    pub fn introduce(&self, target: &Value, introduction: &Value) -> AspectResult<()> {
        let Value::Function(source) = introduction else {
            return Err(AspectError::InvalidIntroduction(introduction.type_name()));
        };
        let surface = resolve_target(target)?;

        // 借用を解放してから書き込む（target と introduction が同一でもよい）
        let members = source.prototype().borrow().entries().to_vec();
        for (name, value) in &members {
            surface.set(name, value.clone());
        }
        debug!(
            "introduced {} member(s) from '{}'",
            members.len(),
            source.name()
        );
        Ok(())
    }

    /// 選択したメソッドの実行前に `advice` を呼ぶ
    pub fn before(
        &self,
        target: &Value,
        selector: impl Into<Selector>,
        advice: impl Into<Value>,
        options: Option<&AspectOptions>,
    ) -> AspectResult<()> {
        let surface = resolve_target(target)?;
        let advice = callable_advice(advice.into())?;
        let wrapped = self.apply_advice(
            &surface,
            &selector.into(),
            options,
            AdviceKind::Before,
            |name, original| {
                let advice = advice.clone();
                Function::new(name, move |this, args| {
                    advice.call(this, args)?;
                    original.call(this, args)
                })
            },
        )?;
        if wrapped > 0 {
            surface.mark_before();
        }
        Ok(())
    }

    /// 選択したメソッドが戻った後に `advice` を呼ぶ（戻り値は元メソッドのもの）
    pub fn after(
        &self,
        target: &Value,
        selector: impl Into<Selector>,
        advice: impl Into<Value>,
        options: Option<&AspectOptions>,
    ) -> AspectResult<()> {
        let surface = resolve_target(target)?;
        let advice = callable_advice(advice.into())?;
        let wrapped = self.apply_advice(
            &surface,
            &selector.into(),
            options,
            AdviceKind::After,
            |name, original| {
                let advice = advice.clone();
                Function::new(name, move |this, args| {
                    let result = original.call(this, args)?;
                    advice.call(this, args)?;
                    Ok(result)
                })
            },
        )?;
        if wrapped > 0 {
            surface.mark_after();
        }
        Ok(())
    }

    /// 選択したメソッドを `advice` で包む
    ///
    /// `advice` は [`Proceed`] を通じて元メソッドを任意の回数呼び出せる。
    /// before/after 適用済みのサーフェスには適用できない（逆順は許可）。
    pub fn around<F>(
        &self,
        target: &Value,
        selector: impl Into<Selector>,
        advice: F,
        options: Option<&AspectOptions>,
    ) -> AspectResult<()>
    where
        F: Fn(&Value, &[Value], &Proceed<'_>) -> CallResult + 'static,
    {
        let surface = resolve_target(target)?;
        if surface.marks().any() {
            return Err(AspectError::Ordering);
        }

        let advice: Rc<AroundFn> = Rc::new(advice);
        self.apply_advice(
            &surface,
            &selector.into(),
            options,
            AdviceKind::Around,
            |name, original| {
                let advice = Rc::clone(&advice);
                Function::new(name, move |this, args| {
                    let proceed = Proceed {
                        original: &original,
                        this,
                        args,
                    };
                    advice(this, args, &proceed)
                })
            },
        )?;
        Ok(())
    }

    /// 一致した各メソッドを `weave` の結果で置き換え、置き換えた数を返す
    fn apply_advice<W>(
        &self,
        surface: &Surface,
        selector: &Selector,
        options: Option<&AspectOptions>,
        kind: AdviceKind,
        weave: W,
    ) -> AspectResult<usize>
    where
        W: Fn(&str, Function) -> Function,
    {
        let options = options.copied().unwrap_or(self.options);
        let names = selector.select(surface);

        if names.is_empty() {
            if options.strict {
                return Err(AspectError::NoMatch(selector.to_string()));
            }
            warn!("{} advice: selector {} matched no methods", kind, selector);
            return Ok(0);
        }

        // 全ての元メソッドを先に解決し、途中で失敗しても書き換えを残さない
        let mut originals = Vec::with_capacity(names.len());
        for name in names {
            match surface.get(&name) {
                Some(Value::Function(original)) => originals.push((name, original)),
                _ => return Err(AspectError::MissingMethod(name)),
            }
        }

        for (name, original) in &originals {
            surface.set(name, Value::Function(weave(name, original.clone())));
            debug!("applied {} advice to '{}'", kind, name);
        }
        Ok(originals.len())
    }
}

/// 関数ならプロトタイプ、オブジェクトならそれ自身をサーフェスとする
pub fn resolve_target(target: &Value) -> AspectResult<Surface> {
    match target {
        Value::Function(function) => Ok(function.prototype_surface()),
        Value::Object(object) => Ok(object.surface().clone()),
        other => Err(AspectError::InvalidTarget(other.type_name())),
    }
}

fn callable_advice(advice: Value) -> AspectResult<Function> {
    match advice {
        Value::Function(function) => Ok(function),
        other => Err(AspectError::AspectType(other.type_name())),
    }
}
