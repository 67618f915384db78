//! Orders typed in from reply envelopes, sorted by what should happen with them.

use crate::order::{header_record, Field, Order};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Parse(#[from] crate::parse::Error),
    #[error("The data entry file has no '{STATUS_COLUMN}' column")]
    MissingStatusColumn,
}

/// The header of the column holding each row's [`Status`].
pub const STATUS_COLUMN: &str = "STATUS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The sender wants to be contacted, and gets a guide.
    Contact,
    /// The sender must not receive any more mail.
    DoNotMail,
    /// The sender gets a guide.
    List,
}

impl Status {
    pub fn parse(value: &str) -> Option<Status> {
        Some(match value.trim() {
            "CONTACT" => Status::Contact,
            "DNC" => Status::DoNotMail,
            "LIST" => Status::List,
            _ => return None,
        })
    }
}

/// The rows of a data entry file, by status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataEntry {
    /// The known columns of the file, in file order.
    pub columns: Vec<Field>,
    pub contacts: Vec<Order>,
    pub do_not_mail: Vec<Order>,
    pub list: Vec<Order>,
}

impl DataEntry {
    /// The orders which should be fulfilled, contacts first.
    pub fn into_orders(self) -> Vec<Order> {
        let mut orders = self.contacts;
        orders.extend(self.list);
        orders
    }
}

pub(crate) mod function {
    use super::{DataEntry, Error, Status, STATUS_COLUMN};
    use crate::order::{Field, Order};

    /// Read a data entry file and sort its rows by their status. Rows with an unknown status are ignored.
    pub fn read_data_entry(csv: impl std::io::Read) -> Result<DataEntry, Error> {
        let mut columns = None;
        let mut status_index = None;
        let outcome = crate::parse::function::read_rows(csv, |headers, record| {
            let columns: &Vec<Option<Field>> = columns
                .get_or_insert_with(|| headers.iter().map(Field::from_header).collect());
            let status_index = *status_index.get_or_insert_with(|| {
                headers
                    .iter()
                    .position(|name| name.trim().eq_ignore_ascii_case(STATUS_COLUMN))
            });
            let mut order = Order::default();
            for (field, value) in columns.iter().zip(record.iter()) {
                if let Some(field) = field {
                    order.set(*field, Some(value));
                }
            }
            let status = status_index
                .and_then(|idx| record.get(idx))
                .and_then(|value| {
                    let status = Status::parse(value);
                    if status.is_none() {
                        tracing::debug!(status = value, "ignoring data entry row");
                    }
                    status
                });
            (status, order)
        })?;

        let mut entry = DataEntry {
            columns: columns
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .collect(),
            ..Default::default()
        };
        if !outcome.records.is_empty() && status_index.flatten().is_none() {
            return Err(Error::MissingStatusColumn);
        }
        for (status, order) in outcome.records {
            match status {
                Some(Status::Contact) => entry.contacts.push(order),
                Some(Status::DoNotMail) => entry.do_not_mail.push(order),
                Some(Status::List) => entry.list.push(order),
                None => {}
            }
        }
        tracing::info!(
            contacts = entry.contacts.len(),
            do_not_mail = entry.do_not_mail.len(),
            list = entry.list.len(),
            "read data entry"
        );
        Ok(entry)
    }
}

/// Write the contacts and, if there are any, the senders who must not be mailed, headed by `date`.
pub fn write_contact_sheet(
    entry: &DataEntry,
    date: &str,
    out: impl std::io::Write,
) -> Result<(), Error> {
    let mut out = csv::WriterBuilder::new().flexible(true).from_writer(out);
    out.write_record([date])?;
    out.write_record(&header_record(&entry.columns, true))?;
    for order in &entry.contacts {
        out.write_record(&order.to_record_of(&entry.columns))?;
    }
    if !entry.do_not_mail.is_empty() {
        // the writer quotes empty records, so the separator line goes straight to the output
        let mut inner = out
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        inner.write_all(b"\n").map_err(csv::Error::from)?;
        out = csv::WriterBuilder::new().flexible(true).from_writer(inner);
        out.write_record(["DO NOT MAIL"])?;
        for order in &entry.do_not_mail {
            out.write_record(&order.to_record_of(&entry.columns))?;
        }
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}
