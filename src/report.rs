use crate::dedup;
use crate::partition::YearGroup;

#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Put all orders into one list named after the first order's plan year.
    pub single_year: bool,
    pub dedup: dedup::Options,
}

pub(crate) mod function {
    use super::Options;
    use crate::order::{header_record, Field, Order};
    use crate::partition::{partition_by_year, single_group, YearGroup};
    use crate::{deduplicate, Normalizer};

    /// Normalize and deduplicate `orders`, then split them into one list per plan year.
    pub fn process(
        orders: Vec<Order>,
        normalizer: &Normalizer,
        Options { single_year, dedup }: Options,
    ) -> Vec<YearGroup> {
        let orders = normalizer.normalize_all(orders);
        let ranked = deduplicate(orders, dedup);
        let groups = if single_year {
            single_group(ranked).into_iter().collect()
        } else {
            partition_by_year(ranked)
        };
        for group in &groups {
            tracing::info!(
                plan_year = group.plan_year.as_str(),
                orders = group.orders.len(),
                "prepared list"
            );
        }
        groups
    }

    /// Write the orders of `group` with an upper-case header row.
    pub fn write_list(group: &YearGroup, out: impl std::io::Write) -> Result<(), csv::Error> {
        let mut out = csv::Writer::from_writer(out);
        out.write_record(&header_record(&Field::ALL, true))?;
        for ranked in &group.orders {
            out.write_record(&ranked.order.to_record())?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write `orders` as they came in, with the canonical header row.
    pub fn write_orders(orders: &[Order], out: impl std::io::Write) -> Result<(), csv::Error> {
        let mut out = csv::Writer::from_writer(out);
        out.write_record(&header_record(&Field::ALL, false))?;
        for order in orders {
            out.write_record(&order.to_record())?;
        }
        out.flush()?;
        Ok(())
    }
}

impl YearGroup {
    /// The file name of this group's list.
    pub fn file_name(&self) -> String {
        format!("{} list.csv", self.plan_year)
    }
}
