/// Split `items` into `count` contiguous, non-overlapping slices.
///
/// Slice size is `ceil(len / count)` and the final slice takes whatever
/// remains, so short inputs leave trailing slices empty. Concatenating the
/// slices in order reproduces the input exactly.
pub fn partition<T>(items: Vec<T>, count: usize) -> Vec<Vec<T>> {
    if count == 0 {
        return Vec::new();
    }
    let unit = items.len().div_ceil(count);
    let mut slices = Vec::with_capacity(count);
    let mut rest = items;
    for i in 0..count {
        let take = if i + 1 == count {
            rest.len()
        } else {
            unit.min(rest.len())
        };
        let tail = rest.split_off(take);
        slices.push(rest);
        rest = tail;
    }
    slices
}

/// Pair each slice with a remote endpoint, assigned round-robin by slice
/// index. There is no rebalancing afterwards: a slice stays on its endpoint
/// for the whole run. `endpoints` must be non-empty.
pub fn bind_endpoints<T>(slices: Vec<Vec<T>>, endpoints: &[String]) -> Vec<(Vec<T>, String)> {
    slices
        .into_iter()
        .enumerate()
        .map(|(i, slice)| (slice, endpoints[i % endpoints.len()].clone()))
        .collect()
}
