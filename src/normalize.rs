//! Rewrite raw field values into their canonical form, driven by a table of rules per field.

use crate::order::{Field, Order};
use std::collections::BTreeMap;

/// How to rewrite the values of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldRule {
    /// Exact, case-sensitive replacements of raw values.
    #[serde(default)]
    pub rewrites: BTreeMap<String, String>,
    /// The value to use if the field is missing or only contains whitespace.
    #[serde(default)]
    pub blank: Option<String>,
}

impl FieldRule {
    fn new(rewrites: &[(&str, &str)], blank: Option<&str>) -> Self {
        FieldRule {
            rewrites: rewrites
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            blank: blank.map(ToOwned::to_owned),
        }
    }

    /// Return the canonical form of `value`, or `None` if it stays as is.
    pub fn rewrite(&self, value: Option<&str>) -> Option<&str> {
        if is_blank(value) {
            self.blank.as_deref()
        } else {
            value.and_then(|v| self.rewrites.get(v)).map(String::as_str)
        }
    }
}

/// The rules for all fields that have any.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RuleSet {
    pub fields: BTreeMap<Field, FieldRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet {
            fields: [
                (
                    Field::ProductCode,
                    FieldRule::new(
                        &[
                            ("MMO ENROLLKIT", "PEK"),
                            ("MMO MGNFR", "MAG"),
                            ("MMO UMG", "UMG"),
                        ],
                        Some("UMG"),
                    ),
                ),
                (
                    Field::ProductDesc,
                    FieldRule::new(
                        &[(
                            "Optional Supplemental Benefit (OSB) Fulfillment Kit",
                            "(OSB) Fulfillment Kit",
                        )],
                        Some("Understanding Medicare Guide"),
                    ),
                ),
                (
                    Field::OrderType,
                    FieldRule::new(
                        &[
                            ("SalesCallCenter", "Call Center"),
                            ("End User", "WEB"),
                            ("CustomerCare", "Customer Service"),
                        ],
                        Some("BRE"),
                    ),
                ),
                (
                    Field::BillToRegion,
                    FieldRule::new(
                        &[("Region 1", "1"), ("Region 1S", "R1S"), ("Region 2", "2")],
                        Some("2"),
                    ),
                ),
                // no blank value means the processing year
                (Field::PlanYear, FieldRule::default()),
            ]
            .into_iter()
            .collect(),
        }
    }
}

/// Returns true if `value` is missing or consists of whitespace only.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Applies a [`RuleSet`] to orders.
#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: Vec<(Field, FieldRule)>,
}

impl Normalizer {
    /// Create a new instance which fills in `processing_year` for orders without plan year, unless
    /// `rules` configure a fixed year for these.
    pub fn new(rules: &RuleSet, processing_year: i32) -> Self {
        let mut rules = rules.fields.clone();
        let plan_year = rules.entry(Field::PlanYear).or_default();
        if plan_year.blank.is_none() {
            plan_year.blank = Some(processing_year.to_string());
        }
        Normalizer {
            rules: rules
                .into_iter()
                .filter(|(field, _)| {
                    let ignored = *field == Field::BrcId;
                    if ignored {
                        tracing::warn!("ignoring normalization rule for {}", field.header());
                    }
                    !ignored
                })
                .collect(),
        }
    }

    /// Rewrite all fields of `order` that have a rule.
    pub fn normalize(&self, order: &mut Order) {
        for (field, rule) in &self.rules {
            if let Some(value) = order.value_mut(*field) {
                if let Some(canonical) = rule.rewrite(value.as_deref()) {
                    *value = Some(canonical.to_owned());
                }
            }
        }
    }

    /// Drop all orders without name or address, and normalize the remaining ones in place.
    pub fn normalize_all(&self, mut orders: Vec<Order>) -> Vec<Order> {
        let before = orders.len();
        orders.retain(|order| {
            !is_blank(order.full_name.as_deref()) && !is_blank(order.address.as_deref())
        });
        if orders.len() != before {
            tracing::debug!(
                dropped = before - orders.len(),
                "dropped orders without name or address"
            );
        }
        for order in &mut orders {
            self.normalize(order);
        }
        orders
    }
}
