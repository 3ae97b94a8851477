//! Property test strategies for effect chains

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

/// Strategy for a permutation of `0..n`
///
/// Used as the order in which parked boxes are completed.
///
/// ```rust
/// use proptest::prelude::*;
/// use ricochet_testkit::strategies::arb_completion_order;
///
/// proptest! {
///     #[test]
///     fn covers_every_index(order in arb_completion_order(5)) {
///         let mut sorted = order.clone();
///         sorted.sort_unstable();
///         prop_assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
///     }
/// }
/// ```
pub fn arb_completion_order(n: usize) -> impl Strategy<Value = Vec<usize>> {
    Just((0..n).collect::<Vec<_>>()).prop_shuffle()
}

/// Strategy for child values together with an order to complete them in
pub fn arb_values_with_order(max_len: usize) -> impl Strategy<Value = (Vec<i64>, Vec<usize>)> {
    prop::collection::vec(any::<i64>(), 0..=max_len).prop_flat_map(|values| {
        let order = arb_completion_order(values.len());
        (Just(values), order)
    })
}
