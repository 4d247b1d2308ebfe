//! Partitioner: split an ordered item list into consecutive segments.

/// Split `items` into at most `parts` consecutive, non-empty segments.
///
/// Segments are balanced: sizes differ by at most one and the longer
/// segments come first, so 7 items over 5 parts gives `[2, 2, 1, 1, 1]`.
/// When there are fewer items than parts, each item gets its own segment
/// and no empty segments are produced. An empty input yields no segments.
///
/// `parts` must be non-zero; the finalizer validates this before calling.
pub fn partition<T>(items: &[T], parts: usize) -> Vec<&[T]> {
    debug_assert!(parts > 0, "part count must be positive");
    if items.is_empty() || parts == 0 {
        return Vec::new();
    }

    let count = parts.min(items.len());
    let base = items.len() / count;
    let extra = items.len() % count;

    let mut segments = Vec::with_capacity(count);
    let mut rest = items;
    for i in 0..count {
        let size = if i < extra { base + 1 } else { base };
        let (head, tail) = rest.split_at(size);
        segments.push(head);
        rest = tail;
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sizes<T>(segments: &[&[T]]) -> Vec<usize> {
        segments.iter().map(|s| s.len()).collect()
    }

    #[test]
    fn test_seven_items_five_parts() {
        let items: Vec<u32> = (0..7).collect();
        let segments = partition(&items, 5);
        assert_eq!(sizes(&segments), vec![2, 2, 1, 1, 1]);
        assert_eq!(segments[0], &[0, 1]);
        assert_eq!(segments[4], &[6]);
    }

    #[test]
    fn test_even_split() {
        let items: Vec<u32> = (0..10).collect();
        let segments = partition(&items, 5);
        assert_eq!(sizes(&segments), vec![2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_fewer_items_than_parts() {
        let items = vec!["only"];
        let segments = partition(&items, 5);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0], &["only"]);

        let items = vec![1, 2, 3];
        assert_eq!(sizes(&partition(&items, 5)), vec![1, 1, 1]);
    }

    #[test]
    fn test_single_part() {
        let items: Vec<u32> = (0..4).collect();
        let segments = partition(&items, 1);
        assert_eq!(segments, vec![&items[..]]);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<u32> = Vec::new();
        assert!(partition(&items, 3).is_empty());
    }

    proptest! {
        #[test]
        fn prop_concatenation_preserves_order(
            items in prop::collection::vec(any::<u16>(), 1..200),
            parts in 1usize..20,
        ) {
            let segments = partition(&items, parts);

            prop_assert_eq!(segments.len(), parts.min(items.len()));
            prop_assert!(segments.iter().all(|s| !s.is_empty()));

            let lens = sizes(&segments);
            let max = lens.iter().copied().max().unwrap_or(0);
            let min = lens.iter().copied().min().unwrap_or(0);
            prop_assert!(max - min <= 1);

            let flat: Vec<u16> = segments.concat();
            prop_assert_eq!(flat, items);
        }
    }
}
