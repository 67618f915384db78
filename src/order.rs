//! The order record and the vocabulary of its columns.

/// One column of an order, in the order it is written to spreadsheets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Field {
    BrcId,
    FullName,
    Address,
    City,
    State,
    Zip,
    Zone,
    ProductCode,
    ProductDesc,
    DropDate,
    OrderType,
    OrderDate,
    Email,
    Phone,
    BillToRegion,
    PlanYear,
    PlanType,
    MemberType,
    WebtrendsCampaignId,
}

impl Field {
    /// All columns in output order, `BrcId` first.
    pub const ALL: [Field; 19] = [
        Field::BrcId,
        Field::FullName,
        Field::Address,
        Field::City,
        Field::State,
        Field::Zip,
        Field::Zone,
        Field::ProductCode,
        Field::ProductDesc,
        Field::DropDate,
        Field::OrderType,
        Field::OrderDate,
        Field::Email,
        Field::Phone,
        Field::BillToRegion,
        Field::PlanYear,
        Field::PlanType,
        Field::MemberType,
        Field::WebtrendsCampaignId,
    ];

    /// The spreadsheet header of this column.
    pub fn header(self) -> &'static str {
        match self {
            Field::BrcId => "BRC_ID",
            Field::FullName => "Full Name",
            Field::Address => "Address",
            Field::City => "City",
            Field::State => "State",
            Field::Zip => "Zip",
            Field::Zone => "Zone",
            Field::ProductCode => "Product Code",
            Field::ProductDesc => "Product Desc",
            Field::DropDate => "Drop Date",
            Field::OrderType => "Order Type",
            Field::OrderDate => "Order Date",
            Field::Email => "Email",
            Field::Phone => "Phone",
            Field::BillToRegion => "Bill To Region",
            Field::PlanYear => "PlanYear",
            Field::PlanType => "PlanType",
            Field::MemberType => "MemberType",
            Field::WebtrendsCampaignId => "WebtrendscampaignIDcode",
        }
    }

    /// The tag name used by the order feed, or `None` for columns we assign ourselves.
    pub fn source_tag(self) -> Option<&'static str> {
        Some(match self {
            Field::BrcId => return None,
            Field::FullName => "ShipToName",
            Field::Address => "ShipToAddress1",
            Field::City => "ShipToCity",
            Field::State => "ShipToState",
            Field::Zip => "ShipToZip",
            Field::Zone => "ShipToAddress3",
            Field::ProductCode => "ProductCode",
            Field::ProductDesc => "ProductName",
            Field::DropDate => "PromiseDate",
            Field::OrderType => "OrderType",
            Field::OrderDate => "OrderDate",
            Field::Email => "UserEmail",
            Field::Phone => "ShipToAddress4",
            Field::BillToRegion => "BillToRegion",
            Field::PlanYear => "PlanYear",
            Field::PlanType => "PlanType",
            Field::MemberType => "MemberType",
            Field::WebtrendsCampaignId => "WebtrendscampaignIDcode",
        })
    }

    /// Find the column whose feed tag is exactly `tag`.
    pub fn from_source_tag(tag: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|field| field.source_tag() == Some(tag))
    }

    /// Find the column with header `name`, ignoring case, as spreadsheets we produce upper-case their headers.
    pub fn from_header(name: &str) -> Option<Field> {
        let name = name.trim();
        Field::ALL
            .into_iter()
            .find(|field| field.header().eq_ignore_ascii_case(name))
    }
}

/// A single mail-order record.
///
/// All fields but `brc_id` may be missing until the order went through [`Normalizer`](crate::Normalizer).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
    pub brc_id: String,
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub zone: Option<String>,
    pub product_code: Option<String>,
    pub product_desc: Option<String>,
    pub drop_date: Option<String>,
    pub order_type: Option<String>,
    pub order_date: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bill_to_region: Option<String>,
    pub plan_year: Option<String>,
    pub plan_type: Option<String>,
    pub member_type: Option<String>,
    pub webtrends_campaign_id: Option<String>,
}

impl Order {
    /// The value of `field`, or `None` if it is missing.
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::BrcId => Some(self.brc_id.as_str()),
            other => self.value(other).and_then(|v| v.as_deref()),
        }
    }

    fn value(&self, field: Field) -> Option<&Option<String>> {
        Some(match field {
            Field::BrcId => return None,
            Field::FullName => &self.full_name,
            Field::Address => &self.address,
            Field::City => &self.city,
            Field::State => &self.state,
            Field::Zip => &self.zip,
            Field::Zone => &self.zone,
            Field::ProductCode => &self.product_code,
            Field::ProductDesc => &self.product_desc,
            Field::DropDate => &self.drop_date,
            Field::OrderType => &self.order_type,
            Field::OrderDate => &self.order_date,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::BillToRegion => &self.bill_to_region,
            Field::PlanYear => &self.plan_year,
            Field::PlanType => &self.plan_type,
            Field::MemberType => &self.member_type,
            Field::WebtrendsCampaignId => &self.webtrends_campaign_id,
        })
    }

    /// Mutable access to an optional field. `brc_id` is always present and thus not reachable here.
    pub fn value_mut(&mut self, field: Field) -> Option<&mut Option<String>> {
        Some(match field {
            Field::BrcId => return None,
            Field::FullName => &mut self.full_name,
            Field::Address => &mut self.address,
            Field::City => &mut self.city,
            Field::State => &mut self.state,
            Field::Zip => &mut self.zip,
            Field::Zone => &mut self.zone,
            Field::ProductCode => &mut self.product_code,
            Field::ProductDesc => &mut self.product_desc,
            Field::DropDate => &mut self.drop_date,
            Field::OrderType => &mut self.order_type,
            Field::OrderDate => &mut self.order_date,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::BillToRegion => &mut self.bill_to_region,
            Field::PlanYear => &mut self.plan_year,
            Field::PlanType => &mut self.plan_type,
            Field::MemberType => &mut self.member_type,
            Field::WebtrendsCampaignId => &mut self.webtrends_campaign_id,
        })
    }

    /// Set `field` to `value`, treating empty strings as missing.
    pub fn set(&mut self, field: Field, value: Option<&str>) {
        let value = value.filter(|v| !v.is_empty());
        match self.value_mut(field) {
            Some(slot) => *slot = value.map(ToOwned::to_owned),
            None => self.brc_id = value.unwrap_or_default().to_owned(),
        }
    }

    /// All values as a spreadsheet row in [`Field::ALL`] order, missing values as empty cells.
    pub fn to_record(&self) -> csv::StringRecord {
        self.to_record_of(&Field::ALL)
    }

    /// The values of `fields` as a spreadsheet row, missing values as empty cells.
    pub fn to_record_of(&self, fields: &[Field]) -> csv::StringRecord {
        fields
            .iter()
            .map(|field| self.get(*field).unwrap_or_default())
            .collect()
    }
}

/// The header row for `fields`, upper-cased if `upper` is set.
pub fn header_record(fields: &[Field], upper: bool) -> csv::StringRecord {
    fields
        .iter()
        .map(|field| {
            if upper {
                field.header().to_uppercase()
            } else {
                field.header().to_owned()
            }
        })
        .collect()
}
