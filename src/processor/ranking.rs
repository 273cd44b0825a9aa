use crate::processor::group_by::Grouped;

/// Number of entries shown in each dashboard ranking.
pub const TOP_N: usize = 10;

/// Sorts entries by value, descending, and keeps the first `n`.
///
/// The sort is stable: equal values keep their incoming (grouping) order, so
/// applying `top_n` to its own output changes nothing.
pub fn top_n<K>(mut entries: Grouped<K>, n: usize) -> Grouped<K> {
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.truncate(n);
    entries
}
