use crate::engine::error::AspectResult;
use crate::engine::object::Surface;
use crate::engine::unique::UniqueVec;
use regex::Regex;
use std::fmt;

/// アドバイス対象のメソッドを選ぶ条件
#[derive(Debug, Clone)]
pub enum Selector {
    /// 完全一致
    Name(String),
    /// 名前のどこかに一致する正規表現
    Pattern(Regex),
    /// 先頭から順に評価して結果を連結
    List(Vec<Selector>),
}

impl Selector {
    pub fn name(name: impl Into<String>) -> Self {
        Selector::Name(name.into())
    }

    pub fn pattern(source: &str) -> AspectResult<Self> {
        Ok(Selector::Pattern(Regex::new(source)?))
    }

    /// サーフェス上で一致する関数名（重複なし、発見順）
    pub fn select(&self, surface: &Surface) -> Vec<String> {
        let mut found = UniqueVec::new();
        self.collect(surface, &mut found);
        found.into_vec()
    }

    fn collect(&self, surface: &Surface, found: &mut UniqueVec<String>) {
        match self {
            Selector::Name(name) => {
                if surface.get(name).is_some_and(|value| value.is_callable()) {
                    found.push_unique(name.clone());
                }
            }
            Selector::Pattern(pattern) => {
                for name in surface.method_names() {
                    if pattern.is_match(&name) {
                        found.push_unique(name);
                    }
                }
            }
            Selector::List(selectors) => {
                for selector in selectors {
                    selector.collect(surface, found);
                }
            }
        }
        log::trace!("selector {} matched {:?}", self, found.as_slice());
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Name(name) => write!(f, "'{}'", name),
            Selector::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
            Selector::List(selectors) => {
                let parts: Vec<String> = selectors.iter().map(|s| s.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::Name(name.to_string())
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::Name(name)
    }
}

impl From<Regex> for Selector {
    fn from(pattern: Regex) -> Self {
        Selector::Pattern(pattern)
    }
}

impl From<Vec<Selector>> for Selector {
    fn from(selectors: Vec<Selector>) -> Self {
        Selector::List(selectors)
    }
}

impl From<Vec<&str>> for Selector {
    fn from(names: Vec<&str>) -> Self {
        Selector::List(names.into_iter().map(Selector::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::object::Function;
    use crate::engine::value::Value;

    fn product_surface() -> Surface {
        let noop = |_: &Value, _: &[Value]| Ok(Value::Undefined);
        let product = Function::class("Product")
            .method("getCost", noop)
            .method("getCurrency", noop)
            .method("getName", noop)
            .method("view", noop);
        product
            .prototype()
            .borrow_mut()
            .set("rate", Value::from(44.3));
        product.prototype_surface()
    }

    #[test]
    fn test_exact_name_requires_callable() {
        let surface = product_surface();
        assert_eq!(Selector::from("view").select(&surface), vec!["view"]);
        assert!(Selector::from("rate").select(&surface).is_empty());
        assert!(Selector::from("missing").select(&surface).is_empty());
    }

    #[test]
    fn test_pattern_searches_anywhere_in_name() {
        let surface = product_surface();
        let selector = Selector::pattern("^get").unwrap();
        assert_eq!(
            selector.select(&surface),
            vec!["getCost", "getCurrency", "getName"]
        );

        // 非関数メンバーは正規表現に一致しても対象外
        assert!(Selector::pattern("rat").unwrap().select(&surface).is_empty());
        assert_eq!(Selector::pattern("Na").unwrap().select(&surface), vec!["getName"]);
    }

    #[test]
    fn test_list_dedupes_within_one_selection() {
        let surface = product_surface();
        let selector = Selector::from(vec![
            Selector::from("view"),
            Selector::pattern("Cur|view").unwrap(),
            Selector::from("getCurrency"),
        ]);
        assert_eq!(selector.select(&surface), vec!["view", "getCurrency"]);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Selector::pattern("get(").is_err());
    }

    #[test]
    fn test_display() {
        let selector = Selector::from(vec![
            Selector::from("view"),
            Selector::pattern("^get").unwrap(),
        ]);
        assert_eq!(selector.to_string(), "['view', /^get/]");
    }
}
