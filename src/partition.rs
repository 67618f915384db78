use crate::dedup::RankedOrder;
use std::collections::BTreeMap;

/// All orders of one plan year, in the order they were given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearGroup {
    pub plan_year: String,
    pub orders: Vec<RankedOrder>,
}

/// Group `orders` by their plan year, with groups sorted by year.
pub fn partition_by_year(orders: Vec<RankedOrder>) -> Vec<YearGroup> {
    let mut groups = BTreeMap::<String, Vec<RankedOrder>>::new();
    for ranked in orders {
        let year = ranked.order.plan_year.clone().unwrap_or_default();
        groups.entry(year).or_default().push(ranked);
    }
    groups
        .into_iter()
        .map(|(plan_year, orders)| YearGroup { plan_year, orders })
        .collect()
}

/// Put all `orders` into a single group named after the plan year of the first order.
///
/// Returns `None` if there are no orders.
pub fn single_group(orders: Vec<RankedOrder>) -> Option<YearGroup> {
    let plan_year = orders.first()?.order.plan_year.clone().unwrap_or_default();
    Some(YearGroup { plan_year, orders })
}
