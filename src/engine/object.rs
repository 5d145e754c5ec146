use crate::engine::error::CallError;
use crate::engine::slots::Slots;
use crate::engine::value::{CallResult, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// 関数本体の型（`this` と引数を受け取る）
pub type NativeFn = dyn Fn(&Value, &[Value]) -> CallResult;

/// 共有メンバーテーブルへのハンドル
pub type SharedTable = Rc<RefCell<MemberTable>>;

// ========================================
// メンバーテーブル
// ========================================

/// before/after アドバイスが適用済みかどうかの印
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdviceMarks {
    pub before: bool,
    pub after: bool,
}

impl AdviceMarks {
    #[inline]
    pub fn any(&self) -> bool {
        self.before || self.after
    }
}

/// 名前 → 値 の可変テーブル（挿入順を保持）
#[derive(Debug, Clone, Default)]
pub struct MemberTable {
    entries: Vec<(String, Value)>,
    marks: AdviceMarks,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// 既存の名前は同じ位置で上書き、新しい名前は末尾に追加
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// 関数が束縛されている名前の一覧
    pub fn method_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, value)| value.is_callable())
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn marks(&self) -> AdviceMarks {
        self.marks
    }

    pub fn mark_before(&mut self) {
        self.marks.before = true;
    }

    pub fn mark_after(&mut self) {
        self.marks.after = true;
    }
}

// ========================================
// ターゲットサーフェス
// ========================================

/// アドバイス操作が読み書きするテーブル
///
/// 読み取りは自身のテーブル → プロトタイプの順に探索し、
/// 書き込みは常に自身のテーブルに対して行う。
#[derive(Clone)]
pub struct Surface {
    table: SharedTable,
    parent: Option<SharedTable>,
}

impl Surface {
    pub fn new(table: SharedTable, parent: Option<SharedTable>) -> Self {
        Self { table, parent }
    }

    /// 値を複製して返す（借用は呼び出し前に解放される）
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.table.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent
            .as_ref()
            .and_then(|parent| parent.borrow().get(name).cloned())
    }

    pub fn set(&self, name: &str, value: Value) {
        self.table.borrow_mut().set(name, value);
    }

    pub fn has(&self, name: &str) -> bool {
        self.table.borrow().has(name)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.borrow().has(name))
    }

    /// 到達可能な関数名の一覧（自身の挿入順 → 隠されていない継承分）
    pub fn method_names(&self) -> Vec<String> {
        let own = self.table.borrow();
        let mut names = own.method_names();
        if let Some(parent) = &self.parent {
            for name in parent.borrow().method_names() {
                if !own.has(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// 自身とプロトタイプの印を合わせたもの
    pub fn marks(&self) -> AdviceMarks {
        let own = self.table.borrow().marks();
        let inherited = self
            .parent
            .as_ref()
            .map(|parent| parent.borrow().marks())
            .unwrap_or_default();
        AdviceMarks {
            before: own.before || inherited.before,
            after: own.after || inherited.after,
        }
    }

    pub fn mark_before(&self) {
        self.table.borrow_mut().mark_before();
    }

    pub fn mark_after(&self) {
        self.table.borrow_mut().mark_after();
    }

    pub fn table(&self) -> &SharedTable {
        &self.table
    }
}

// ========================================
// 関数（コンストラクタを兼ねる）
// ========================================

struct FunctionInner {
    name: String,
    body: Box<NativeFn>,
    prototype: SharedTable,
}

/// 呼び出し可能な値
///
/// 全ての関数は共有プロトタイプテーブルを持ち、`construct` で
/// 生成されたインスタンスはこのテーブルを継承する。
#[derive(Clone)]
pub struct Function {
    inner: Rc<FunctionInner>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> CallResult + 'static,
    {
        Self {
            inner: Rc::new(FunctionInner {
                name: name.into(),
                body: Box::new(body),
                prototype: Rc::new(RefCell::new(MemberTable::new())),
            }),
        }
    }

    /// 本体を持たないコンストラクタ（メソッド置き場としてのクラス）
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, |_, _| Ok(Value::Undefined))
    }

    /// プロトタイプにメソッドを追加する
    pub fn method<F>(self, name: &str, body: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> CallResult + 'static,
    {
        let method = Function::new(name, body);
        self.inner
            .prototype
            .borrow_mut()
            .set(name, Value::Function(method));
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    pub fn call(&self, this: &Value, args: &[Value]) -> CallResult {
        (self.inner.body)(this, args)
    }

    pub fn prototype(&self) -> SharedTable {
        Rc::clone(&self.inner.prototype)
    }

    /// プロトタイプテーブルをサーフェスとして取得
    pub fn prototype_surface(&self) -> Surface {
        Surface::new(self.prototype(), None)
    }

    /// 新しいインスタンスを生成し、本体を `this` = インスタンスで実行する
    pub fn construct(&self, args: &[Value]) -> Result<Object, CallError> {
        let object = Object::with_prototype(Some(self.prototype()));
        self.call(&Value::Object(object.clone()), args)?;
        Ok(object)
    }

    pub fn ptr_eq(a: &Function, b: &Function) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.inner.name)
    }
}

// ========================================
// オブジェクト
// ========================================

/// 自身のメンバーテーブルとプロトタイプへのリンクを持つインスタンス
#[derive(Clone)]
pub struct Object {
    surface: Surface,
}

impl Object {
    pub fn new() -> Self {
        Self::with_prototype(None)
    }

    pub fn with_prototype(prototype: Option<SharedTable>) -> Self {
        Self {
            surface: Surface::new(Rc::new(RefCell::new(MemberTable::new())), prototype),
        }
    }

    /// 構造体のフィールドをデータメンバーとして持つオブジェクトを生成
    pub fn with_slots<S: Slots>(slots: &S) -> Self {
        let object = Self::new();
        object.assign_slots(slots);
        object
    }

    pub fn assign_slots<S: Slots>(&self, slots: &S) {
        for (key, value) in slots.slots() {
            self.surface.set(&key, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.surface.get(name)
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.surface.set(name, value.into());
    }

    pub fn has(&self, name: &str) -> bool {
        self.surface.has(name)
    }

    /// 数値メンバーを取得（存在しない・数値でない場合は None）
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|value| value.as_number())
    }

    /// メソッドを探索し、このオブジェクトを `this` として呼び出す
    pub fn invoke(&self, name: &str, args: &[Value]) -> CallResult {
        match self.get(name) {
            Some(Value::Function(method)) => method.call(&Value::Object(self.clone()), args),
            Some(other) => Err(CallError::NotCallable(format!(
                "{} ({})",
                name,
                other.type_name()
            ))),
            None => Err(CallError::NoSuchMethod(name.to_string())),
        }
    }

    /// 自身のメンバーのみ（継承分を含まない）
    pub fn own_entries(&self) -> Vec<(String, Value)> {
        self.surface.table().borrow().entries().to_vec()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// `function` の `construct` で生成されたかどうか
    pub fn is_instance_of(&self, function: &Function) -> bool {
        self.surface
            .parent
            .as_ref()
            .is_some_and(|parent| Rc::ptr_eq(parent, &function.inner.prototype))
    }

    pub(crate) fn identity(&self) -> *const RefCell<MemberTable> {
        Rc::as_ptr(self.surface.table())
    }

    pub fn ptr_eq(a: &Object, b: &Object) -> bool {
        Rc::ptr_eq(a.surface.table(), b.surface.table())
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", Value::Object(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_class() -> Function {
        Function::new("Counter", |this, args| {
            let object = this.receiver()?;
            object.set("n", args.first().cloned().unwrap_or(Value::from(0)));
            Ok(Value::Undefined)
        })
        .method("get", |this, _| {
            Ok(this.receiver()?.get("n").unwrap_or_default())
        })
    }

    #[test]
    fn test_member_table_keeps_insertion_order() {
        let mut table = MemberTable::new();
        table.set("b", Value::from(1));
        table.set("a", Value::from(2));
        table.set("b", Value::from(3));

        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(table.get("b"), Some(&Value::from(3)));
        assert!(table.method_names().is_empty());
    }

    #[test]
    fn test_construct_links_prototype() {
        let counter = counter_class();
        let instance = counter.construct(&[Value::from(5)]).unwrap();

        assert!(instance.is_instance_of(&counter));
        assert_eq!(instance.invoke("get", &[]).unwrap(), Value::from(5));
        // メソッドは共有テーブル側にある
        assert!(instance.own_entries().iter().all(|(k, _)| k != "get"));
    }

    #[test]
    fn test_prototype_change_reaches_existing_instances() {
        let counter = counter_class();
        let instance = counter.construct(&[]).unwrap();

        counter.prototype().borrow_mut().set(
            "get",
            Value::Function(Function::new("get", |_, _| Ok(Value::from(42)))),
        );

        assert_eq!(instance.invoke("get", &[]).unwrap(), Value::from(42));
    }

    #[test]
    fn test_invoke_errors() {
        let object = Object::new();
        object.set("data", 1);

        assert_eq!(
            object.invoke("missing", &[]).unwrap_err(),
            CallError::NoSuchMethod("missing".to_string())
        );
        assert!(matches!(
            object.invoke("data", &[]),
            Err(CallError::NotCallable(_))
        ));
    }

    #[test]
    fn test_surface_method_names_include_inherited() {
        let counter = counter_class().method("reset", |_, _| Ok(Value::Undefined));
        let instance = counter.construct(&[]).unwrap();
        instance.set("own", Function::new("own", |_, _| Ok(Value::Null)));
        // データメンバーで隠された継承メソッドは候補にならない
        instance.set("reset", false);

        assert_eq!(instance.surface().method_names(), vec!["own", "get"]);
    }

    #[test]
    fn test_method_may_rewrite_table_while_running() {
        let class = Function::class("Selfish").method("swap", |this, _| {
            let object = this.receiver()?;
            object.set("swap", Function::new("swap", |_, _| Ok(Value::from("swapped"))));
            Ok(Value::from("first"))
        });
        let instance = class.construct(&[]).unwrap();

        assert_eq!(instance.invoke("swap", &[]).unwrap(), Value::from("first"));
        assert_eq!(instance.invoke("swap", &[]).unwrap(), Value::from("swapped"));
    }
}
