use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::Value;

/// The sequence produced when iterating over a [Substitute][crate::Substitute].
///
/// Clones share the same sequence. Replacing the sequence never affects traversals already
/// started.
#[derive(Clone, Default)]
pub struct Yields {
    items: Rc<RefCell<Rc<[Value]>>>,
}

impl Yields {
    /// Replace the whole sequence.
    pub fn set<I, T>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let items: Rc<[Value]> = items.into_iter().map(Into::into).collect();
        *self.items.borrow_mut() = items;
    }

    /// Start a new traversal, from the first item of the current sequence.
    pub fn iter(&self) -> Traversal {
        Traversal {
            items: self.items.borrow().clone(),
            position: 0,
        }
    }
}

impl fmt::Debug for Yields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.borrow().iter()).finish()
    }
}

impl PartialEq for Yields {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}

impl IntoIterator for &Yields {
    type Item = Value;
    type IntoIter = Traversal;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An independent cursor over a snapshot of a [Yields] sequence.
#[derive(Debug, Clone)]
pub struct Traversal {
    items: Rc<[Value]>,
    position: usize,
}

impl Iterator for Traversal {
    type Item = Value;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.items.get(self.position).cloned();
        if item.is_some() {
            self.position += 1;
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Traversal {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_sequence_is_empty() {
        let yields = Yields::default();

        assert_eq!(0, yields.iter().len());
        assert_eq!(None, yields.iter().next());
    }

    #[test]
    fn traversals_are_restartable_and_independent() {
        let yields = Yields::default();
        yields.set(["a", "b", "c"]);

        let mut first = yields.iter();
        assert_eq!(Some(Value::from("a")), first.next());

        let second: Vec<Value> = yields.iter().collect();
        assert_eq!(
            vec![Value::from("a"), Value::from("b"), Value::from("c")],
            second
        );

        let rest: Vec<Value> = first.collect();
        assert_eq!(vec![Value::from("b"), Value::from("c")], rest);
    }

    #[test]
    fn replacing_the_sequence_does_not_affect_started_traversals() {
        let yields = Yields::default();
        yields.set([1, 2]);
        let started = yields.iter();

        yields.set([3]);

        assert_eq!(vec![Value::Int(1), Value::Int(2)], started.collect::<Vec<_>>());
        assert_eq!(vec![Value::Int(3)], yields.iter().collect::<Vec<_>>());
    }

    #[test]
    fn clones_share_the_sequence() {
        let yields = Yields::default();
        let shared = yields.clone();

        shared.set(["x"]);

        assert_eq!(vec![Value::from("x")], (&yields).into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn traversal_reports_exact_remaining_size() {
        let yields = Yields::default();
        yields.set([1, 2, 3]);
        let mut traversal = yields.iter();
        traversal.next();

        assert_eq!(2, traversal.len());
    }
}
