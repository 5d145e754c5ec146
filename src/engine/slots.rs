use crate::engine::object::Object;
use crate::engine::value::Value;

/// 構造体フィールドとオブジェクトのデータメンバーを相互変換するトレイト
///
/// 通常は `#[derive(Slots)]` で実装する。フィールド名は
/// `#[slots(rename = "...")]` でメンバー名を変更できる。
pub trait Slots {
    /// (メンバー名, 値) の一覧
    fn slots(&self) -> Vec<(String, Value)>;

    /// 1つのメンバーをフィールドへ読み込む
    fn load_slot(&mut self, key: &str, value: &Value) -> Result<(), String>;

    /// オブジェクトに存在するメンバーだけをまとめて読み込む
    fn load_slots(&mut self, object: &Object) -> Result<(), String> {
        for (key, _) in self.slots() {
            if let Some(value) = object.get(&key) {
                self.load_slot(&key, &value)?;
            }
        }
        Ok(())
    }
}
