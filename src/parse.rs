use crate::order::{Field, Order};
use std::collections::BTreeMap;

/// The text of each tag of a single feed order, keyed by tag name. `None` marks an element without text.
pub type RawOrder = BTreeMap<String, Option<String>>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The order source could not be read")]
    SourceUnavailable(#[source] csv::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    fn classify(err: csv::Error) -> Self {
        if matches!(err.kind(), csv::ErrorKind::Io(_)) {
            Error::SourceUnavailable(err)
        } else {
            Error::Csv(err)
        }
    }
}

/// What happened while reading a source, besides the records themselves.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub records: Vec<T>,
    /// The 1-based lines of rows that were skipped as they could not be mapped onto the header.
    pub malformed_lines: Vec<u64>,
}

pub(crate) mod function {
    use super::{Error, Outcome, RawOrder};
    use crate::order::{Field, Order};

    /// Turn raw feed orders into [`Order`]s, preserving their order.
    ///
    /// Tags that aren't part of the feed vocabulary are ignored, missing tags leave their field empty.
    pub fn parse_orders(raw: impl IntoIterator<Item = RawOrder>) -> Vec<Order> {
        raw.into_iter().map(|raw| super::order_from_raw(&raw)).collect()
    }

    /// Read an exported order feed whose header row names the feed tags, one raw order per row.
    ///
    /// Rows whose field count doesn't match the header are skipped and reported in the outcome.
    pub fn read_raw_orders(csv: impl std::io::Read) -> Result<Outcome<RawOrder>, Error> {
        read_rows(csv, |headers, record| {
            headers
                .iter()
                .zip(record.iter())
                .map(|(tag, value)| {
                    (
                        tag.trim().to_owned(),
                        (!value.is_empty()).then(|| value.to_owned()),
                    )
                })
                .collect()
        })
    }

    /// Read a spreadsheet export whose header row uses the canonical (or upper-cased) column names.
    ///
    /// Columns that aren't known are ignored.
    pub fn read_orders(csv: impl std::io::Read) -> Result<Outcome<Order>, Error> {
        let mut columns = None::<Vec<Option<Field>>>;
        read_rows(csv, |headers, record| {
            let columns = columns.get_or_insert_with(|| {
                headers.iter().map(Field::from_header).collect::<Vec<_>>()
            });
            let mut order = Order::default();
            for (field, value) in columns.iter().zip(record.iter()) {
                if let Some(field) = field {
                    order.set(*field, Some(value));
                }
            }
            order
        })
    }

    pub(crate) fn read_rows<T>(
        csv: impl std::io::Read,
        mut make: impl FnMut(&csv::StringRecord, &csv::StringRecord) -> T,
    ) -> Result<Outcome<T>, Error> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv);
        let headers = csv.headers().map_err(Error::classify)?.clone();
        let mut out = Outcome {
            records: Vec::new(),
            malformed_lines: Vec::new(),
        };
        for record in csv.records() {
            let record = match record {
                Ok(record) => record,
                Err(err) if matches!(err.kind(), csv::ErrorKind::Utf8 { .. }) => {
                    let line = err.position().map(|pos| pos.line()).unwrap_or_default();
                    tracing::warn!(line, "skipping row with invalid UTF-8");
                    out.malformed_lines.push(line);
                    continue;
                }
                Err(err) => return Err(Error::classify(err)),
            };
            if record.len() != headers.len() {
                let line = record.position().map(|pos| pos.line()).unwrap_or_default();
                tracing::warn!(
                    line,
                    expected = headers.len(),
                    actual = record.len(),
                    "skipping row that doesn't match the header"
                );
                out.malformed_lines.push(line);
                continue;
            }
            out.records.push(make(&headers, &record));
        }
        Ok(out)
    }
}

fn order_from_raw(raw: &RawOrder) -> Order {
    let mut order = Order::default();
    for (tag, value) in raw {
        if let Some(field) = Field::from_source_tag(tag) {
            order.set(field, value.as_deref());
        }
    }
    order
}
