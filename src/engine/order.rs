use std::{cmp::Ordering, collections::HashMap};

use super::{
    aggregate::{Aggregate, Bucket, Total},
    prefs::{CardOrder, Preferences},
    record::{Category, CategoryId},
};

/// Orders the buckets of an aggregate for presentation. Untracked time always goes last.
///
/// Categories unknown to `categories` sort after the known ones, by id.
pub fn sorted_totals(
    aggregate: &Aggregate,
    categories: &[Category],
    prefs: &Preferences,
) -> Vec<(Bucket, Total)> {
    let known = categories
        .iter()
        .map(|v| (v.id, v))
        .collect::<HashMap<CategoryId, &Category>>();

    let mut totals = aggregate
        .categories
        .iter()
        .map(|(id, total)| (*id, *total))
        .collect::<Vec<_>>();

    let by_name = |a: &CategoryId, b: &CategoryId| match (known.get(a), known.get(b)) {
        (Some(a), Some(b)) => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then(a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    };

    totals.sort_by(|(a, a_total), (b, b_total)| match prefs.card_order {
        CardOrder::Name => by_name(a, b),
        CardOrder::Color => {
            let color = |id: &CategoryId| known.get(id).map_or(u32::MAX, |v| v.color);
            color(a).cmp(&color(b)).then_with(|| by_name(a, b))
        }
        CardOrder::Duration => b_total
            .duration
            .cmp(&a_total.duration)
            .then_with(|| by_name(a, b)),
        CardOrder::Manual => {
            let position = |id: &CategoryId| prefs.manual_card_order.get(id).copied().unwrap_or(i64::MAX);
            position(a).cmp(&position(b)).then_with(|| by_name(a, b))
        }
    });

    totals
        .into_iter()
        .map(|(id, total)| (Bucket::Category(id), total))
        .chain(aggregate.untracked.map(|v| (Bucket::Untracked, v)))
        .collect()
}
