use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Store-assigned key of an employee row.
///
/// Identity columns come back as integers and uuid columns as strings; the
/// value is echoed back to the store in whichever shape it arrived.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum EmployeeId {
    Int(i64),
    Text(String),
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployeeId::Int(value) => write!(f, "{value}"),
            EmployeeId::Text(value) => f.write_str(value),
        }
    }
}

impl FromStr for EmployeeId {
    type Err = std::convert::Infallible;

    /// Text that is the canonical rendering of an integer becomes `Int`, so
    /// it matches identity keys decoded from JSON. Anything else, including
    /// zero-padded digits such as `007`, stays a text key.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Ok(match trimmed.parse::<i64>() {
            Ok(value) if value.to_string() == trimmed => EmployeeId::Int(value),
            _ => EmployeeId::Text(trimmed.to_string()),
        })
    }
}

impl From<i64> for EmployeeId {
    fn from(value: i64) -> Self {
        EmployeeId::Int(value)
    }
}

impl From<String> for EmployeeId {
    fn from(value: String) -> Self {
        EmployeeId::Text(value)
    }
}

/// One row of the employees table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(default, deserialize_with = "nullable_text")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub role: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub phone: String,
}

impl Employee {
    pub fn new(id: impl Into<EmployeeId>, fields: EmployeeFields) -> Self {
        Self {
            id: id.into(),
            name: fields.name,
            role: fields.role,
            email: fields.email,
            phone: fields.phone,
        }
    }

    pub fn fields(&self) -> EmployeeFields {
        EmployeeFields {
            name: self.name.clone(),
            role: self.role.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    pub fn get(&self, field: EmployeeField) -> &str {
        match field {
            EmployeeField::Name => &self.name,
            EmployeeField::Role => &self.role,
            EmployeeField::Email => &self.email,
            EmployeeField::Phone => &self.phone,
        }
    }
}

/// The four editable columns, without a key. Used for inserts, updates and
/// form scratch state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EmployeeFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl EmployeeFields {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// True when every field holds at least one character. Whitespace counts.
    pub fn is_complete(&self) -> bool {
        EmployeeField::ALL
            .iter()
            .all(|field| !self.get(*field).is_empty())
    }

    pub fn get(&self, field: EmployeeField) -> &str {
        match field {
            EmployeeField::Name => &self.name,
            EmployeeField::Role => &self.role,
            EmployeeField::Email => &self.email,
            EmployeeField::Phone => &self.phone,
        }
    }

    pub fn set(&mut self, field: EmployeeField, value: impl Into<String>) {
        let slot = match field {
            EmployeeField::Name => &mut self.name,
            EmployeeField::Role => &mut self.role,
            EmployeeField::Email => &mut self.email,
            EmployeeField::Phone => &mut self.phone,
        };
        *slot = value.into();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EmployeeField {
    Name,
    Role,
    Email,
    Phone,
}

impl EmployeeField {
    pub const ALL: [EmployeeField; 4] = [
        EmployeeField::Name,
        EmployeeField::Role,
        EmployeeField::Email,
        EmployeeField::Phone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmployeeField::Name => "name",
            EmployeeField::Role => "role",
            EmployeeField::Email => "email",
            EmployeeField::Phone => "phone",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EmployeeField::Name => "Name",
            EmployeeField::Role => "Role",
            EmployeeField::Email => "Email",
            EmployeeField::Phone => "Phone",
        }
    }
}

impl fmt::Display for EmployeeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown employee field `{0}`")]
pub struct UnknownField(pub String);

impl FromStr for EmployeeField {
    type Err = UnknownField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "name" => Ok(EmployeeField::Name),
            "role" => Ok(EmployeeField::Role),
            "email" => Ok(EmployeeField::Email),
            "phone" => Ok(EmployeeField::Phone),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

fn nullable_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
