use crate::types::{Rankable, SortOrder};
use std::cmp::Ordering;

/// Sort a copy of `records` by `field`.
///
/// The sort is stable, so equal values keep their sheet order. Records with
/// a missing value go last in either direction.
pub fn rank<R>(records: &[R], field: R::Field, order: SortOrder) -> Vec<R>
where
    R: Rankable + Clone,
{
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| compare(a.metric(field), b.metric(field), order));
    sorted
}

fn compare(a: Option<f64>, b: Option<f64>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The first `n` records of the descending ranking.
pub fn top<R>(records: &[R], n: usize, field: R::Field) -> Vec<R>
where
    R: Rankable + Clone,
{
    rank(records, field, SortOrder::Descending)
        .into_iter()
        .take(n)
        .collect()
}

/// The last `n` records of the descending ranking, still in descending order.
pub fn bottom<R>(records: &[R], n: usize, field: R::Field) -> Vec<R>
where
    R: Rankable + Clone,
{
    let sorted = rank(records, field, SortOrder::Descending);
    let skip = sorted.len().saturating_sub(n);
    sorted.into_iter().skip(skip).collect()
}
