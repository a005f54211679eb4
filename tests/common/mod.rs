// tests/common/mod.rs
//
// Shared entity fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use query_spec::{Entity, EntityType, PropertyKind, Record, RecordExt, Value};
use rust_decimal::Decimal;

pub const STATUS: &[&str] = &["Active", "Suspended", "Closed"];

// ============================================================================
// Address
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Address {
    pub city: String,
    pub country: String,
}

static ADDRESS: LazyLock<EntityType> = LazyLock::new(|| {
    EntityType::new("Address")
        .with_property("City", PropertyKind::String)
        .with_property("Country", PropertyKind::String)
});

impl Entity for Address {
    fn entity_type() -> &'static EntityType {
        &ADDRESS
    }

    fn get(&self, property: &str) -> Option<Value> {
        match property {
            "City" => Some(self.city.clone().into()),
            "Country" => Some(self.country.clone().into()),
            _ => None,
        }
    }

    fn from_record(record: &Record) -> query_spec::Result<Self> {
        Ok(Address {
            city: record.value_of("City").unwrap_or_default(),
            country: record.value_of("Country").unwrap_or_default(),
        })
    }
}

fn address_from(value: Option<&Value>) -> query_spec::Result<Option<Address>> {
    match value {
        Some(Value::Record(record)) => Address::from_record(record).map(Some),
        _ => Ok(None),
    }
}

fn address_value(address: &Option<Address>) -> Value {
    address
        .as_ref()
        .map_or(Value::Null, |a| Value::Record(a.to_record()))
}

// ============================================================================
// Employee
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Employee {
    pub name: String,
    pub title: String,
    pub address: Option<Address>,
}

static EMPLOYEE: LazyLock<EntityType> = LazyLock::new(|| {
    EntityType::new("Employee")
        .with_property("Name", PropertyKind::String)
        .with_property("Title", PropertyKind::String)
        .with_nullable_property("Address", PropertyKind::entity::<Address>())
});

impl Entity for Employee {
    fn entity_type() -> &'static EntityType {
        &EMPLOYEE
    }

    fn get(&self, property: &str) -> Option<Value> {
        match property {
            "Name" => Some(self.name.clone().into()),
            "Title" => Some(self.title.clone().into()),
            "Address" => Some(address_value(&self.address)),
            _ => None,
        }
    }

    fn from_record(record: &Record) -> query_spec::Result<Self> {
        Ok(Employee {
            name: record.value_of("Name").unwrap_or_default(),
            title: record.value_of("Title").unwrap_or_default(),
            address: address_from(record.get("Address"))?,
        })
    }
}

// ============================================================================
// Company
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub revenue: Decimal,
    pub rating: f64,
    pub active: bool,
    pub founded: DateTime<Utc>,
    pub status: &'static str,
    pub parent_name: Option<String>,
    pub address: Option<Address>,
    pub employees: Vec<Employee>,
}

impl Default for Company {
    fn default() -> Self {
        Company {
            id: 0,
            name: String::new(),
            revenue: Decimal::ZERO,
            rating: 0.0,
            active: false,
            founded: DateTime::<Utc>::UNIX_EPOCH,
            status: STATUS[0],
            parent_name: None,
            address: None,
            employees: Vec::new(),
        }
    }
}

static COMPANY: LazyLock<EntityType> = LazyLock::new(|| {
    EntityType::new("Company")
        .with_property("Id", PropertyKind::Integer)
        .with_property("Name", PropertyKind::String)
        .with_property("Revenue", PropertyKind::Decimal)
        .with_property("Rating", PropertyKind::Float)
        .with_property("Active", PropertyKind::Boolean)
        .with_property("Founded", PropertyKind::DateTime)
        .with_property("Status", PropertyKind::Enum(STATUS))
        .with_nullable_property("ParentName", PropertyKind::String)
        .with_nullable_property("Address", PropertyKind::entity::<Address>())
        .with_property("Employees", PropertyKind::collection_of::<Employee>())
});

impl Entity for Company {
    fn entity_type() -> &'static EntityType {
        &COMPANY
    }

    fn get(&self, property: &str) -> Option<Value> {
        match property {
            "Id" => Some(self.id.into()),
            "Name" => Some(self.name.clone().into()),
            "Revenue" => Some(self.revenue.into()),
            "Rating" => Some(self.rating.into()),
            "Active" => Some(self.active.into()),
            "Founded" => Some(self.founded.into()),
            "Status" => Some(self.status.into()),
            "ParentName" => Some(self.parent_name.clone().into()),
            "Address" => Some(address_value(&self.address)),
            "Employees" => Some(Value::List(
                self.employees
                    .iter()
                    .map(|e| Value::Record(e.to_record()))
                    .collect(),
            )),
            _ => None,
        }
    }

    fn from_record(record: &Record) -> query_spec::Result<Self> {
        let status = record
            .value_of::<String>("Status")
            .and_then(|s| STATUS.iter().copied().find(|v| *v == s))
            .unwrap_or(STATUS[0]);
        Ok(Company {
            id: record.value_of("Id").unwrap_or_default(),
            name: record.value_of("Name").unwrap_or_default(),
            revenue: record.value_of("Revenue").unwrap_or_default(),
            rating: record.value_of("Rating").unwrap_or_default(),
            active: record.value_of("Active").unwrap_or_default(),
            founded: record
                .value_of("Founded")
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            status,
            parent_name: record.value_of::<Option<String>>("ParentName").flatten(),
            address: address_from(record.get("Address"))?,
            employees: Vec::new(),
        })
    }
}

// ============================================================================
// CompanyDto
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompanyDto {
    pub id: i64,
    pub company_name: String,
    pub city: Option<String>,
}

static COMPANY_DTO: LazyLock<EntityType> = LazyLock::new(|| {
    EntityType::new("CompanyDto")
        .with_property("Id", PropertyKind::Integer)
        .with_property("CompanyName", PropertyKind::String)
        .with_nullable_property("City", PropertyKind::String)
});

impl Entity for CompanyDto {
    fn entity_type() -> &'static EntityType {
        &COMPANY_DTO
    }

    fn get(&self, property: &str) -> Option<Value> {
        match property {
            "Id" => Some(self.id.into()),
            "CompanyName" => Some(self.company_name.clone().into()),
            "City" => Some(self.city.clone().into()),
            _ => None,
        }
    }

    fn from_record(record: &Record) -> query_spec::Result<Self> {
        Ok(CompanyDto {
            id: record.value_of("Id").unwrap_or_default(),
            company_name: record.value_of("CompanyName").unwrap_or_default(),
            city: record.value_of::<Option<String>>("City").flatten(),
        })
    }
}

// ============================================================================
// Sample data
// ============================================================================

pub fn address(city: &str, country: &str) -> Address {
    Address {
        city: city.to_string(),
        country: country.to_string(),
    }
}

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Five companies with distinct ids 1..=5.
///
/// | Id | Name            | Revenue  | Rating | Active | Status    | City   |
/// |----|-----------------|----------|--------|--------|-----------|--------|
/// | 1  | Acme Corp       | 1500.50  | 4.5    | true   | Active    | Berlin |
/// | 2  | Globex          | 800      | 3.0    | true   | Suspended | Boston |
/// | 3  | Initech         | 1500.50  | 2.5    | false  | Closed    | (none) |
/// | 4  | acme industries | 2200     | 4.0    | true   | Active    | Bergen |
/// | 5  | Umbrella        | 50       | 1.5    | false  | Active    | Berlin |
pub fn companies() -> Vec<Company> {
    vec![
        Company {
            id: 1,
            name: "Acme Corp".into(),
            revenue: Decimal::new(150050, 2),
            rating: 4.5,
            active: true,
            founded: date(1999, 5, 1),
            status: "Active",
            parent_name: None,
            address: Some(address("Berlin", "DE")),
            employees: vec![Employee {
                name: "Wile".into(),
                title: "Engineer".into(),
                address: Some(address("Tucson", "US")),
            }],
        },
        Company {
            id: 2,
            name: "Globex".into(),
            revenue: Decimal::new(800, 0),
            rating: 3.0,
            active: true,
            founded: date(2005, 3, 15),
            status: "Suspended",
            parent_name: Some("Globex Holdings".into()),
            address: Some(address("Boston", "US")),
            employees: Vec::new(),
        },
        Company {
            id: 3,
            name: "Initech".into(),
            revenue: Decimal::new(150050, 2),
            rating: 2.5,
            active: false,
            founded: date(1988, 11, 30),
            status: "Closed",
            parent_name: None,
            address: None,
            employees: Vec::new(),
        },
        Company {
            id: 4,
            name: "acme industries".into(),
            revenue: Decimal::new(2200, 0),
            rating: 4.0,
            active: true,
            founded: date(2015, 1, 1),
            status: "Active",
            parent_name: Some("Acme Corp".into()),
            address: Some(address("Bergen", "NO")),
            employees: Vec::new(),
        },
        Company {
            id: 5,
            name: "Umbrella".into(),
            revenue: Decimal::new(50, 0),
            rating: 1.5,
            active: false,
            founded: date(1970, 7, 7),
            status: "Active",
            parent_name: None,
            address: Some(address("Berlin", "DE")),
            employees: Vec::new(),
        },
    ]
}

pub fn ids(companies: &[Company]) -> Vec<i64> {
    companies.iter().map(|c| c.id).collect()
}
