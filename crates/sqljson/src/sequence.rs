//! Sequence algebra: the value domain of path evaluation
//!
//! A sequence is an ordered list of items. Order is significant and duplicates
//! are kept. Lax mode adds two shape-forgiving rules:
//! - wrap: an array accessor applied to a non-array sees `[item]`
//! - unwrap: consumers of non-array items see an array's elements instead

use crate::ir::PathMode;
use crate::item::Item;

/// When lax-mode unwrapping applies.
///
/// Unwrapping happens at each consuming step (member accessors, filters,
/// arithmetic and comparison operands, numeric methods), one level deep. It is
/// never recursive and never applied to the final result of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnwrapPolicy {
    Never,
    EachStepOneLevel,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence(Vec<Item>);

impl Sequence {
    pub fn empty() -> Self {
        Sequence(Vec::new())
    }

    pub fn singleton(item: Item) -> Self {
        Sequence(vec![item])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.0.iter()
    }

    pub fn into_items(self) -> Vec<Item> {
        self.0
    }

    pub fn push(&mut self, item: Item) {
        self.0.push(item);
    }

    /// Append another sequence, keeping order
    pub fn extend(&mut self, other: Sequence) {
        self.0.extend(other.0);
    }

    /// The single item, if there is exactly one
    pub fn into_singleton(self) -> Result<Item, Sequence> {
        if self.0.len() == 1 {
            let mut items = self.0;
            Ok(items.remove(0))
        } else {
            Err(self)
        }
    }

    /// Replace every array item by its elements (one level), under lax mode
    pub fn unwrap_arrays(self, mode: PathMode) -> Sequence {
        match mode.unwrap_policy() {
            UnwrapPolicy::Never => self,
            UnwrapPolicy::EachStepOneLevel => {
                if !self.0.iter().any(Item::is_array) {
                    return self;
                }
                let mut out = Vec::with_capacity(self.0.len());
                for item in self.0 {
                    match item {
                        Item::Array(elements) => out.extend(elements),
                        other => out.push(other),
                    }
                }
                Sequence(out)
            }
        }
    }

    /// Wrap the sequence into one array item (JSON_QUERY wrappers)
    pub fn wrap_into_array(self) -> Item {
        Item::Array(self.0)
    }
}

/// View an item as array elements for an array accessor.
///
/// Lax mode treats a non-array as a one-element array; strict mode has no
/// such view and the caller reports a structural error.
pub fn wrap(item: &Item, mode: PathMode) -> Option<&[Item]> {
    match item {
        Item::Array(elements) => Some(elements),
        other if mode.is_lax() => Some(std::slice::from_ref(other)),
        _ => None,
    }
}

impl From<Vec<Item>> for Sequence {
    fn from(items: Vec<Item>) -> Self {
        Sequence(items)
    }
}

impl FromIterator<Item> for Sequence {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Sequence(iter.into_iter().collect())
    }
}

impl IntoIterator for Sequence {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> Sequence {
        Sequence::from(vec![
            Item::int(1),
            Item::Array(vec![Item::int(2), Item::Array(vec![Item::int(3)])]),
        ])
    }

    #[test]
    fn lax_unwrap_is_one_level() {
        let unwrapped = nested().unwrap_arrays(PathMode::Lax);
        assert_eq!(
            unwrapped.items(),
            &[Item::int(1), Item::int(2), Item::Array(vec![Item::int(3)])]
        );
    }

    #[test]
    fn strict_never_unwraps() {
        assert_eq!(nested().unwrap_arrays(PathMode::Strict), nested());
    }

    #[test]
    fn wrap_scalar_only_in_lax() {
        let scalar = Item::string("x");
        assert_eq!(wrap(&scalar, PathMode::Lax).map(<[Item]>::len), Some(1));
        assert!(wrap(&scalar, PathMode::Strict).is_none());

        let array = Item::Array(vec![Item::Null, Item::Null]);
        assert_eq!(wrap(&array, PathMode::Strict).map(<[Item]>::len), Some(2));
    }

    #[test]
    fn singleton_extraction() {
        assert_eq!(
            Sequence::singleton(Item::Null).into_singleton(),
            Ok(Item::Null)
        );
        assert!(Sequence::empty().into_singleton().is_err());
        assert!(nested().into_singleton().is_err());
    }
}
