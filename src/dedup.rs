use crate::order::{Field, Order};

/// The columns whose text is canonicalized before comparing orders.
pub const CANONICAL_FIELDS: [Field; 3] = [Field::FullName, Field::Address, Field::City];

#[derive(Clone, Debug)]
pub struct Options {
    /// Orders whose name contains this text, compared case-insensitively, are considered tests and dropped.
    pub test_marker: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            test_marker: "test".into(),
        }
    }
}

/// An order which survived deduplication, along with its 1-based position among all survivors in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedOrder {
    pub ordinal: usize,
    pub order: Order,
}

/// Upper-case the first letter of each word and lower-case all others.
///
/// A word starts after any character that has no case, so `o'neil` becomes `O'Neil` and `4th` becomes `4Th`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_cased = false;
    for c in text.chars() {
        let is_cased = c.is_lowercase() || c.is_uppercase();
        if is_cased && previous_is_cased {
            out.extend(c.to_lowercase());
        } else if is_cased {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        previous_is_cased = is_cased;
    }
    out
}

/// Title-case `text` and collapse whitespace runs between words into single spaces.
///
/// Leading and trailing whitespace is kept as is.
pub fn canonicalize(text: &str) -> String {
    let text = title_case(text);
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len();
    if start >= end {
        return text;
    }
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    for (idx, word) in text[start..end].split_whitespace().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.push_str(&text[end..]);
    out
}

pub(crate) mod function {
    use super::{canonicalize, Options, RankedOrder, CANONICAL_FIELDS};
    use crate::order::Order;
    use std::collections::HashSet;

    /// Canonicalize names and addresses, drop test orders and later duplicates of the same name and address,
    /// then rank the survivors and sort them by product code.
    ///
    /// Orders with the same product code keep their relative order.
    pub fn deduplicate(orders: Vec<Order>, Options { test_marker }: Options) -> Vec<RankedOrder> {
        let test_marker = test_marker.to_lowercase();
        let total = orders.len();
        let mut seen = HashSet::new();
        let mut tests = 0;
        let mut survivors: Vec<_> = orders
            .into_iter()
            .map(|mut order| {
                for field in CANONICAL_FIELDS {
                    if let Some(value) = order.value_mut(field).and_then(Option::as_mut) {
                        *value = canonicalize(value);
                    }
                }
                order
            })
            .filter(|order| {
                let name = order.full_name.as_deref().unwrap_or_default();
                let is_test = !test_marker.is_empty() && name.to_lowercase().contains(&test_marker);
                if is_test {
                    tracing::debug!(name, "dropping test order");
                    tests += 1;
                }
                !is_test
            })
            .filter(|order| {
                seen.insert((
                    order.full_name.clone().unwrap_or_default(),
                    order.address.clone().unwrap_or_default(),
                ))
            })
            .enumerate()
            .map(|(idx, order)| RankedOrder {
                ordinal: idx + 1,
                order,
            })
            .collect();
        survivors.sort_by(|a, b| a.order.product_code.cmp(&b.order.product_code));

        tracing::info!(
            total,
            tests,
            duplicates = total - tests - survivors.len(),
            kept = survivors.len(),
            "deduplicated orders"
        );
        survivors
    }
}
