/// 重複を許さない順序付きシーケンス
///
/// `push_unique` は既に同じ要素があれば何もしない（insert-if-absent）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueVec<T> {
    items: Vec<T>,
}

impl<T> Default for UniqueVec<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: PartialEq> UniqueVec<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加できた場合は true
    pub fn push_unique(&mut self, item: T) -> bool {
        if self.items.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: PartialEq> FromIterator<T> for UniqueVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut unique = Self::new();
        for item in iter {
            unique.push_unique(item);
        }
        unique
    }
}

impl<T> IntoIterator for UniqueVec<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_unique_keeps_first_position() {
        let mut names = UniqueVec::new();
        assert!(names.push_unique("view"));
        assert!(names.push_unique("getCost"));
        assert!(!names.push_unique("view"));

        assert_eq!(names.as_slice(), &["view", "getCost"]);
    }

    #[test]
    fn test_collect_dedupes() {
        let names: UniqueVec<i32> = vec![3, 1, 3, 2, 1].into_iter().collect();
        assert_eq!(names.into_vec(), vec![3, 1, 2]);
    }
}
