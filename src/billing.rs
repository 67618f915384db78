//! Per-row postage and handling charges for a month of fulfillment jobs.

use crate::normalize::is_blank;
use crate::order::{Field, Order};
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Parse(#[from] crate::parse::Error),
    #[error("The amount {0} is not a finite, non-negative number")]
    InvalidAmount(f64),
    #[error("'{input}' is not a valid junk mail count: {reason}")]
    InvalidOperatorInput { input: String, reason: &'static str },
}

/// A sum of money, kept as whole cents to make sums exact.
///
/// Configuration files spell it as a non-negative decimal number, like `8.30`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_cents(cents: i64) -> Self {
        Amount(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    /// This amount `count` times.
    pub fn times(self, count: u32) -> Self {
        Amount(self.0.saturating_mul(i64::from(count)))
    }
}

impl TryFrom<f64> for Amount {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidAmount(value));
        }
        Ok(Amount((value * 100.0).round() as i64))
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> Self {
        amount.0 as f64 / 100.0
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |a, b| a + b)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

/// The prices used to bill each row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Charges {
    /// Postage for sending out the package, by product code. Unknown codes are sent for free.
    pub postage_out: BTreeMap<String, Amount>,
    /// Postage for each business reply envelope we receive.
    pub reply_postage: Amount,
    /// Charge for typing in a reply envelope.
    pub data_entry: Amount,
    /// Charged for every row.
    pub fulfillment: Amount,
    /// The order type of rows that came in by reply envelope.
    pub reply_order_type: String,
    /// Product code of OSB kits, which are priced differently if sent to prospects.
    pub osb_code: String,
    /// The campaign id marking a row as sent to a prospect.
    pub prospect_marker: String,
    /// The product code to look up postage with for OSB kits sent to prospects.
    pub osb_prospect_code: String,
}

impl Default for Charges {
    fn default() -> Self {
        Charges {
            postage_out: [
                ("PEK", 830),
                ("MAG", 184),
                ("MMO OSB", 205),
                ("MMO OSB PROSPECT", 268),
                ("UMG", 184),
            ]
            .into_iter()
            .map(|(code, cents)| (code.to_owned(), Amount::from_cents(cents)))
            .collect(),
            reply_postage: Amount::from_cents(64),
            data_entry: Amount::from_cents(20),
            fulfillment: Amount::from_cents(52),
            reply_order_type: "BRE".into(),
            osb_code: "MMO OSB".into(),
            prospect_marker: "Prospect".into(),
            osb_prospect_code: "MMO OSB PROSPECT".into(),
        }
    }
}

impl Charges {
    /// The product code to look up the postage of `row` with.
    pub fn effective_code<'a>(&'a self, row: &'a JobRow) -> Option<&'a str> {
        let code = row.product_code.as_deref()?;
        if code == self.osb_code
            && row.campaign_id.as_deref() == Some(self.prospect_marker.as_str())
        {
            Some(self.osb_prospect_code.as_str())
        } else {
            Some(code)
        }
    }

    fn is_reply(&self, row: &JobRow) -> bool {
        row.order_type.as_deref() == Some(self.reply_order_type.as_str())
    }

    /// Compute the charges for a single order row.
    pub fn line_item(&self, row: JobRow) -> BillingLineItem {
        let is_reply = self.is_reply(&row);
        let postage_out = match self.effective_code(&row) {
            Some(code) => self.postage_out.get(code).copied().unwrap_or_else(|| {
                tracing::debug!(code, "no postage configured for product code");
                Amount::ZERO
            }),
            None => Amount::ZERO,
        };
        BillingLineItem::new(
            if is_reply { self.reply_postage } else { Amount::ZERO },
            postage_out,
            if is_reply { self.data_entry } else { Amount::ZERO },
            self.fulfillment,
            1,
            Some(row),
        )
    }

    /// The line item accounting for `count` reply envelopes that didn't contain an order.
    pub fn junk_mail(&self, count: u32) -> BillingLineItem {
        BillingLineItem::new(
            self.reply_postage.times(count),
            Amount::ZERO,
            Amount::ZERO,
            Amount::ZERO,
            count,
            None,
        )
    }
}

/// One row of a job file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRow {
    pub product_code: Option<String>,
    pub order_type: Option<String>,
    pub campaign_id: Option<String>,
    /// Rows without address aren't counted in the [`JobSummary`].
    pub address: Option<String>,
    /// All cells of the row as `(header, value)` pairs, in file order.
    pub cells: Vec<(String, String)>,
}

impl JobRow {
    /// The row of a list written by the report pipeline for `order`.
    pub fn from_order(order: &Order) -> Self {
        JobRow {
            product_code: order.product_code.clone(),
            order_type: order.order_type.clone(),
            campaign_id: order.webtrends_campaign_id.clone(),
            address: order.address.clone(),
            cells: Field::ALL
                .into_iter()
                .map(|field| {
                    (
                        field.header().to_uppercase(),
                        order.get(field).unwrap_or_default().to_owned(),
                    )
                })
                .collect(),
        }
    }
}

/// The rows of one fulfillment job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Job {
    pub label: String,
    pub rows: Vec<JobRow>,
}

/// How often each product code was seen in a job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub label: String,
    pub counts: BTreeMap<String, u64>,
    pub grand_total: u64,
}

impl JobSummary {
    /// Count the addressed rows of `job` by product code. Rows without product code or address aren't counted.
    pub fn of(job: &Job) -> Self {
        let mut counts = BTreeMap::<String, u64>::new();
        for code in job
            .rows
            .iter()
            .filter(|row| !is_blank(row.address.as_deref()))
            .filter_map(|row| row.product_code.as_deref())
            .filter(|code| !is_blank(Some(*code)))
        {
            *counts.entry(code.to_owned()).or_default() += 1;
        }
        JobSummary {
            label: job.label.clone(),
            grand_total: counts.values().sum(),
            counts,
        }
    }
}

/// The charges of one row. `total` is always the sum of all other charges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingLineItem {
    postage_in: Amount,
    postage_out: Amount,
    data_entry: Amount,
    fulfillment_charge: Amount,
    total: Amount,
    count: u32,
    row: Option<JobRow>,
}

impl BillingLineItem {
    pub fn new(
        postage_in: Amount,
        postage_out: Amount,
        data_entry: Amount,
        fulfillment_charge: Amount,
        count: u32,
        row: Option<JobRow>,
    ) -> Self {
        BillingLineItem {
            postage_in,
            postage_out,
            data_entry,
            fulfillment_charge,
            total: postage_in + postage_out + data_entry + fulfillment_charge,
            count,
            row,
        }
    }

    pub fn postage_in(&self) -> Amount {
        self.postage_in
    }
    pub fn postage_out(&self) -> Amount {
        self.postage_out
    }
    pub fn data_entry(&self) -> Amount {
        self.data_entry
    }
    pub fn fulfillment_charge(&self) -> Amount {
        self.fulfillment_charge
    }
    pub fn total(&self) -> Amount {
        self.total
    }
    pub fn count(&self) -> u32 {
        self.count
    }
    /// The job row this item was computed from, or `None` for junk mail.
    pub fn row(&self) -> Option<&JobRow> {
        self.row.as_ref()
    }
}

/// Column sums over all line items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BillingTotals {
    pub postage_in: Amount,
    pub postage_out: Amount,
    pub data_entry: Amount,
    pub fulfillment_charge: Amount,
    pub total: Amount,
    pub count: u64,
}

impl<'a> std::iter::Sum<&'a BillingLineItem> for BillingTotals {
    fn sum<I: Iterator<Item = &'a BillingLineItem>>(iter: I) -> Self {
        iter.fold(BillingTotals::default(), |acc, item| BillingTotals {
            postage_in: acc.postage_in + item.postage_in,
            postage_out: acc.postage_out + item.postage_out,
            data_entry: acc.data_entry + item.data_entry,
            fulfillment_charge: acc.fulfillment_charge + item.fulfillment_charge,
            total: acc.total + item.total,
            count: acc.count + u64::from(item.count),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingReport {
    pub summaries: Vec<JobSummary>,
    /// The items of all jobs in job order, followed by the junk mail item.
    pub items: Vec<BillingLineItem>,
    pub totals: BillingTotals,
    pub junk_count: u32,
}

impl BillingReport {
    /// The amount of rows that were actual orders.
    pub fn order_count(&self) -> u64 {
        self.totals.count - u64::from(self.junk_count)
    }
}

/// The names of the charge columns, in output order.
pub const CHARGE_HEADERS: [&str; 6] = [
    "Postage In",
    "Postage Out",
    "Data Entry",
    "Fulfillment Charge",
    "TTL",
    "Count",
];

/// Return the job label within `file_name`, like `W12A`, or `None` if it isn't a job file.
pub fn job_label(file_name: &str) -> Option<&str> {
    static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    PATTERN
        .get_or_init(|| regex::Regex::new(r"W\d{1,2}[A-E]").expect("valid pattern"))
        .find(file_name)
        .map(|m| m.as_str())
}

/// The name of a billing run, derived from the first job's file name.
pub fn run_name(file_name: &str) -> &str {
    file_name
        .char_indices()
        .nth(8)
        .map_or(file_name, |(idx, _)| &file_name[..idx])
}

/// Parse the junk mail count as typed in by the operator.
pub fn parse_junk_count(input: &str) -> Result<u32, Error> {
    let input = input.trim();
    let invalid = |reason| Error::InvalidOperatorInput {
        input: input.to_owned(),
        reason,
    };
    match input.parse::<i64>() {
        Ok(count) if count < 0 => Err(invalid("it must not be negative")),
        Ok(count) => u32::try_from(count).map_err(|_| invalid("it is too large")),
        Err(_) => Err(invalid("it is not a whole number")),
    }
}

pub(crate) mod function {
    use super::{
        BillingLineItem, BillingReport, BillingTotals, Charges, Error, Job, JobRow, JobSummary,
        CHARGE_HEADERS,
    };
    use crate::order::Field;

    /// Read the rows of a job file which has a header row.
    pub fn read_job(label: impl Into<String>, csv: impl std::io::Read) -> Result<Job, Error> {
        let label: String = label.into();
        let outcome = crate::parse::function::read_rows(csv, |headers, record| {
            let mut row = JobRow::default();
            for (header, value) in headers.iter().zip(record.iter()) {
                let value = (!value.is_empty()).then(|| value.to_owned());
                match Field::from_header(header) {
                    Some(Field::ProductCode) => row.product_code = value.clone(),
                    Some(Field::OrderType) => row.order_type = value.clone(),
                    Some(Field::WebtrendsCampaignId) => row.campaign_id = value.clone(),
                    Some(Field::Address) => row.address = value.clone(),
                    _ => {}
                }
                row.cells.push((header.to_owned(), value.unwrap_or_default()));
            }
            row
        })?;
        tracing::debug!(label = label.as_str(), rows = outcome.records.len(), "read job");
        Ok(Job {
            label,
            rows: outcome.records,
        })
    }

    /// Summarize each job, then bill all of their rows plus `junk_count` reply envelopes without order.
    pub fn calculate(jobs: Vec<Job>, junk_count: u32, charges: &Charges) -> BillingReport {
        let summaries: Vec<_> = jobs.iter().map(JobSummary::of).collect();
        let mut items: Vec<BillingLineItem> = jobs
            .into_iter()
            .flat_map(|job| job.rows)
            .map(|row| charges.line_item(row))
            .collect();
        items.push(charges.junk_mail(junk_count));
        let totals: BillingTotals = items.iter().sum();
        tracing::info!(
            jobs = summaries.len(),
            rows = items.len() - 1,
            junk_count,
            "computed billing"
        );
        BillingReport {
            summaries,
            items,
            totals,
            junk_count,
        }
    }

    /// Write a breakdown of product codes for each job.
    pub fn write_summary(report: &BillingReport, out: impl std::io::Write) -> Result<(), Error> {
        let mut out = csv::WriterBuilder::new().from_writer(out);
        for summary in &report.summaries {
            out.write_record([format!("{} Breakdown", summary.label).as_str(), ""])?;
            out.write_record(["Product Code", "Count"])?;
            for (code, count) in &summary.counts {
                out.write_record([code.as_str(), count.to_string().as_str()])?;
            }
            out.write_record(["Grand Total", summary.grand_total.to_string().as_str()])?;
        }
        out.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Write the billing sheet: junk mail and order counts, the totals, then one row per line item.
    ///
    /// Job columns follow the charge columns, in the order they were first seen.
    pub fn write_billing(report: &BillingReport, out: impl std::io::Write) -> Result<(), Error> {
        let mut columns = Vec::<&str>::new();
        for row in report.items.iter().filter_map(BillingLineItem::row) {
            for (header, _) in &row.cells {
                if !columns.contains(&header.as_str()) {
                    columns.push(header);
                }
            }
        }

        let mut out = csv::WriterBuilder::new().flexible(true).from_writer(out);
        out.write_record(["Total Junk Mail", report.junk_count.to_string().as_str()])?;
        out.write_record(["Order Count", report.order_count().to_string().as_str()])?;
        let totals = &report.totals;
        out.write_record([
            totals.postage_in.to_string(),
            totals.postage_out.to_string(),
            totals.data_entry.to_string(),
            totals.fulfillment_charge.to_string(),
            totals.total.to_string(),
            totals.count.to_string(),
        ])?;
        let mut header: Vec<&str> = CHARGE_HEADERS.to_vec();
        header.extend(columns.iter().copied());
        out.write_record(&header)?;
        for item in &report.items {
            let mut record = csv::StringRecord::new();
            for amount in [
                item.postage_in(),
                item.postage_out(),
                item.data_entry(),
                item.fulfillment_charge(),
                item.total(),
            ] {
                record.push_field(&amount.to_string());
            }
            record.push_field(&item.count().to_string());
            for column in &columns {
                record.push_field(
                    item.row()
                        .and_then(|row| {
                            row.cells
                                .iter()
                                .find(|(header, _)| header.as_str() == *column)
                        })
                        .map(|(_, value)| value.as_str())
                        .unwrap_or_default(),
                );
            }
            out.write_record(&record)?;
        }
        out.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}
