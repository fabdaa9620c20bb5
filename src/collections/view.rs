//! Zero-copy indexable views.
//!
//! A [`SequenceView`] exposes `len` and `get(index)` over some backing
//! source without copying it. Views compose: [`StackedView`] concatenates
//! several of them, and [`FnView`] wraps an index function so one view can
//! filter or remap another.

/// Read-only, index-addressable sequence.
pub trait SequenceView {
    type Item;

    fn len(&self) -> usize;

    /// Returns the element at `index`.
    ///
    /// # Panics
    ///
    /// If `index >= self.len()`.
    fn get(&self, index: usize) -> Self::Item;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signed lookup: negative indices count back from the end.
    fn at(&self, index: isize) -> Option<Self::Item> {
        let len = self.len() as isize;
        let index = if index < 0 { index + len } else { index };
        (0..len).contains(&index).then(|| self.get(index as usize))
    }

    /// Iterates the view front to back.
    fn iter(&self) -> ViewIter<'_, Self>
    where
        Self: Sized,
    {
        ViewIter {
            view: self,
            next: 0,
        }
    }
}

impl<V: SequenceView + ?Sized> SequenceView for Box<V> {
    type Item = V::Item;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Self::Item {
        (**self).get(index)
    }
}

/// Sequential iterator over any view.
#[derive(Debug)]
pub struct ViewIter<'a, V: ?Sized> {
    view: &'a V,
    next: usize,
}

impl<V: SequenceView> Iterator for ViewIter<'_, V> {
    type Item = V::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.view.len() {
            return None;
        }
        let item = self.view.get(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

/// View over a slice of `Copy` elements.
#[derive(Debug, Clone, Copy)]
pub struct SliceView<'a, T>(pub &'a [T]);

impl<T: Copy> SequenceView for SliceView<'_, T> {
    type Item = T;

    fn len(&self) -> usize {
        self.0.len()
    }

    fn get(&self, index: usize) -> T {
        self.0[index]
    }
}

/// View backed by an index function and a length.
#[derive(Clone)]
pub struct FnView<F> {
    len: usize,
    get: F,
}

impl<F> FnView<F> {
    pub fn new(len: usize, get: F) -> Self {
        Self { len, get }
    }
}

impl<T, F: Fn(usize) -> T> SequenceView for FnView<F> {
    type Item = T;

    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> T {
        assert!(index < self.len, "index {index} out of bounds for length {}", self.len);
        (self.get)(index)
    }
}

/// Concatenation of several views.
///
/// Lookup walks the cumulative-length table from the end. Stacks here hold a
/// handful of views, so a linear walk beats a binary search in practice.
pub struct StackedView<'a, T> {
    views: Vec<Box<dyn SequenceView<Item = T> + 'a>>,
    offsets: Vec<usize>,
    len: usize,
}

impl<'a, T> Default for StackedView<'a, T> {
    fn default() -> Self {
        Self {
            views: Vec::new(),
            offsets: Vec::new(),
            len: 0,
        }
    }
}

impl<'a, T> StackedView<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `view` to the end of the stack.
    pub fn push<V>(&mut self, view: V)
    where
        V: SequenceView<Item = T> + 'a,
    {
        self.offsets.push(self.len);
        self.len += view.len();
        self.views.push(Box::new(view));
    }

    /// Builder-style [`push`](Self::push).
    pub fn with<V>(mut self, view: V) -> Self
    where
        V: SequenceView<Item = T> + 'a,
    {
        self.push(view);
        self
    }

    /// Iterates by chaining the sub-view iterators.
    pub fn chained(&self) -> impl Iterator<Item = T> + '_ {
        self.views
            .iter()
            .flat_map(|view| (0..view.len()).map(move |i| view.get(i)))
    }
}

impl<T> SequenceView for StackedView<'_, T> {
    type Item = T;

    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> T {
        assert!(index < self.len, "index {index} out of bounds for length {}", self.len);
        for (view, &offset) in self.views.iter().zip(&self.offsets).rev() {
            if index >= offset && index - offset < view.len() {
                return view.get(index - offset);
            }
        }
        unreachable!("offsets cover every index below len")
    }
}

impl<T> std::fmt::Debug for StackedView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackedView")
            .field("views", &self.views.len())
            .field("offsets", &self.offsets)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack<'a>(parts: &[&'a [&'static str]]) -> StackedView<'a, &'static str> {
        let mut view = StackedView::new();
        for part in parts {
            view.push(SliceView(*part));
        }
        view
    }

    #[test]
    fn test_slice_view() {
        let data = [1, 2, 3];
        let view = SliceView(&data);
        assert_eq!(view.len(), 3);
        assert_eq!(view.iter().collect::<Vec<_>>(), data);
        assert_eq!(view.at(-1), Some(3));
        assert_eq!(view.at(3), None);
    }

    #[test]
    fn test_fn_view() {
        let data = vec![10, 20, 30];
        let view = FnView::new(data.len(), |i| data[i] / 10);
        assert_eq!(view.iter().collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(view.at(-3), Some(1));
    }

    #[test]
    fn test_stacked_simple() {
        let view = stack(&[&["a", "aa"], &[], &["b", "bb", "bbb"], &["c"], &[]]);
        assert_eq!(view.len(), 6);
        assert_eq!(view.get(0), "a");
        assert_eq!(view.get(3), "bb");
        assert_eq!(view.at(-1), Some("c"));
        assert_eq!(view.iter().collect::<Vec<_>>(), ["a", "aa", "b", "bb", "bbb", "c"]);
        assert_eq!(view.chained().collect::<Vec<_>>(), ["a", "aa", "b", "bb", "bbb", "c"]);
    }

    #[test]
    fn test_stacked_empty() {
        assert_eq!(StackedView::<u8>::new().len(), 0);
        let nested = StackedView::<u8>::new()
            .with(SliceView(&[]))
            .with(StackedView::new().with(SliceView(&[])));
        assert!(nested.is_empty());
        assert_eq!(nested.iter().count(), 0);
    }

    #[test]
    fn test_stacked_almost_empty() {
        let view = StackedView::new()
            .with(SliceView(&[]))
            .with(SliceView(&[1]))
            .with(SliceView(&[]));
        assert_eq!(view.iter().collect::<Vec<_>>(), [1]);
    }

    #[test]
    fn test_stacked_nested() {
        let view = StackedView::new()
            .with(stack(&[&["a", "aa"]]))
            .with(
                StackedView::new()
                    .with(SliceView(&["b", "bb", "bbb"][..]))
                    .with(StackedView::new().with(stack(&[&["c"]]))),
            );
        assert_eq!(view.get(0), "a");
        assert_eq!(view.get(3), "bb");
        assert_eq!(view.at(-1), Some("c"));
        assert_eq!(view.chained().collect::<Vec<_>>(), ["a", "aa", "b", "bb", "bbb", "c"]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_stacked_out_of_bounds() {
        stack(&[&["a"]]).get(1);
    }
}
