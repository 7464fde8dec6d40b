//! `And`/`Or`/`Not`/`Filter` combinators (spec.md §9).
//!
//! These are plain higher-order helpers over a `Predicate<T> = Fn(&T) ->
//! bool`. `filter` preserves the property that an absent predicate is
//! non-allocating: with `None` it hands back the input unchanged instead
//! of re-collecting it.

pub trait Predicate<T: ?Sized> {
    fn test(&self, item: &T) -> bool;
}

impl<T: ?Sized, F: Fn(&T) -> bool> Predicate<T> for F {
    fn test(&self, item: &T) -> bool {
        self(item)
    }
}

/// `And(a, b)`: matches iff both `a` and `b` match.
pub fn and<'a, T: 'a>(
    a: impl Predicate<T> + 'a,
    b: impl Predicate<T> + 'a,
) -> Box<dyn Fn(&T) -> bool + 'a> {
    Box::new(move |item: &T| a.test(item) && b.test(item))
}

/// `Or(a, b)`: matches iff either `a` or `b` matches.
pub fn or<'a, T: 'a>(
    a: impl Predicate<T> + 'a,
    b: impl Predicate<T> + 'a,
) -> Box<dyn Fn(&T) -> bool + 'a> {
    Box::new(move |item: &T| a.test(item) || b.test(item))
}

/// `Not(a)`: matches iff `a` does not.
pub fn not<'a, T: 'a>(a: impl Predicate<T> + 'a) -> Box<dyn Fn(&T) -> bool + 'a> {
    Box::new(move |item: &T| !a.test(item))
}

/// Filters `items` by `predicate` when present. With `predicate = None`
/// the input is returned unchanged — no allocation, no clone.
pub fn filter<T>(items: Vec<T>, predicate: Option<impl Fn(&T) -> bool>) -> Vec<T> {
    match predicate {
        Some(p) => items.into_iter().filter(|item| p(item)).collect(),
        None => items,
    }
}

/// Borrowing counterpart of [`filter`] for callers that don't want to
/// consume the input vector.
pub fn filter_ref<'a, T>(items: &'a [T], predicate: impl Fn(&T) -> bool) -> Vec<&'a T> {
    items.iter().filter(|item| predicate(item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_none_is_identity_without_allocating_a_new_predicate() {
        let items = vec![1, 2, 3];
        let ptr_before = items.as_ptr();
        let result = filter(items, None::<fn(&i32) -> bool>);
        assert_eq!(result, vec![1, 2, 3]);
        // Moved through unchanged; same backing allocation.
        assert_eq!(result.as_ptr(), ptr_before);
    }

    #[test]
    fn and_or_not_compose() {
        let is_even = |x: &i32| x % 2 == 0;
        let is_positive = |x: &i32| *x > 0;

        let even_and_positive = and(is_even, is_positive);
        assert!(even_and_positive(&2));
        assert!(!even_and_positive(&-2));
        assert!(!even_and_positive(&3));

        let even_or_positive = or(is_even, is_positive);
        assert!(even_or_positive(&-2));
        assert!(even_or_positive(&3));
        assert!(!even_or_positive(&-3));

        let odd = not(is_even);
        assert!(odd(&3));
        assert!(!odd(&2));
    }
}
