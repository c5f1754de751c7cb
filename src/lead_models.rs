use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::errors::AppError;

/// Accepted keys for each logical lead field, in lookup order.
///
/// Popup form tools let site owners name fields freely, so the same value
/// shows up under several spellings.
pub mod aliases {
    pub const FIRST_NAME: &[&str] = &["firstName", "firstname", "first_name", "First Name", "fname"];
    pub const LAST_NAME: &[&str] = &["lastName", "lastname", "last_name", "Last Name", "lname"];
    pub const EMAIL: &[&str] = &["email", "Email", "emailAddress", "email_address", "E-mail"];
    pub const PHONE: &[&str] = &[
        "phone",
        "Phone",
        "phoneNumber",
        "phone_number",
        "Phone Number",
        "telephone",
    ];
    pub const PROPERTY_ID: &[&str] = &["propertyId", "propertyid", "property_id", "Property ID"];
    pub const NOTES: &[&str] = &["notes", "message", "Message", "comments", "comment"];
    pub const MOVE_IN_DATE: &[&str] = &[
        "moveInDate",
        "movein_date",
        "move_in_date",
        "Move In Date",
        "desiredMoveInDate",
    ];
    pub const BEDROOMS: &[&str] = &["bedrooms", "Bedrooms", "beds"];
    pub const BATHROOMS: &[&str] = &["bathrooms", "Bathrooms", "baths"];
    pub const UNIT_TYPE: &[&str] = &["unitType", "unit_type", "Unit Type"];
    pub const SOURCE: &[&str] = &["source", "leadSource", "marketingSource", "utm_source"];
    pub const SMS_OPT_IN: &[&str] = &["smsOptIn", "sms_opt_in", "optInSms", "SMS Opt In", "smsConsent"];
}

/// Trimmed value, or `None` when blank.
fn clean(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Textual form of a JSON scalar. Arrays, objects and null are absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Returns the first non-blank value found under any of `aliases`.
pub fn resolve_field(record: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|key| record.get(*key).and_then(scalar_text))
}

/// Same as [`resolve_field`] for string-only maps such as query parameters.
pub fn resolve_param(params: &HashMap<String, String>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|key| params.get(*key).and_then(|v| clean(v)))
}

/// A raw lead submission plus the URL-level property overrides.
#[derive(Debug, Clone, Default)]
pub struct IncomingLead {
    body: Map<String, Value>,
    query: HashMap<String, String>,
    path_property_id: Option<String>,
}

impl IncomingLead {
    /// Wraps a JSON body. Anything other than an object is rejected.
    pub fn from_body(body: Value) -> Result<Self, AppError> {
        match body {
            Value::Object(body) => Ok(Self {
                body,
                ..Default::default()
            }),
            other => Err(AppError::BadRequest(format!(
                "Expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_path_property_id(mut self, property_id: Option<String>) -> Self {
        self.path_property_id = property_id.and_then(|p| clean(&p));
        self
    }

    /// Resolves every logical field.
    ///
    /// `propertyId` comes from the body, then the query string, then the
    /// path segment, then `default_property_id`.
    pub fn resolve(&self, default_property_id: Option<&str>) -> ResolvedLead {
        let field = |aliases: &[&str]| resolve_field(&self.body, aliases);

        let property_id = field(aliases::PROPERTY_ID)
            .or_else(|| resolve_param(&self.query, aliases::PROPERTY_ID))
            .or_else(|| self.path_property_id.clone())
            .or_else(|| default_property_id.and_then(clean));

        ResolvedLead {
            first_name: field(aliases::FIRST_NAME),
            last_name: field(aliases::LAST_NAME),
            email: field(aliases::EMAIL),
            phone: field(aliases::PHONE),
            property_id,
            notes: field(aliases::NOTES),
            move_in_date: field(aliases::MOVE_IN_DATE),
            bedrooms: field(aliases::BEDROOMS),
            bathrooms: field(aliases::BATHROOMS),
            unit_type: field(aliases::UNIT_TYPE),
            source: field(aliases::SOURCE),
            sms_opt_in: field(aliases::SMS_OPT_IN),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Lead fields after alias resolution; nothing is guaranteed present yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLead {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub property_id: Option<String>,
    pub notes: Option<String>,
    pub move_in_date: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub unit_type: Option<String>,
    pub source: Option<String>,
    pub sms_opt_in: Option<String>,
}

impl ResolvedLead {
    /// Names of the required fields that are absent, in check order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("propertyId", &self.property_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Checks required fields and produces a [`Lead`].
    pub fn validate(self) -> Result<Lead, AppError> {
        let missing = self.missing_fields();

        match self {
            ResolvedLead {
                first_name: Some(first_name),
                last_name: Some(last_name),
                email: Some(email),
                phone: Some(phone),
                property_id: Some(property_id),
                notes,
                move_in_date,
                bedrooms,
                bathrooms,
                unit_type,
                source,
                sms_opt_in,
            } => Ok(Lead {
                first_name,
                last_name,
                email,
                phone,
                property_id,
                notes,
                move_in_date,
                bedrooms,
                bathrooms,
                unit_type,
                source,
                sms_opt_in,
            }),
            _ => Err(AppError::missing_fields(missing)),
        }
    }
}

/// A lead with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub property_id: String,
    pub notes: Option<String>,
    pub move_in_date: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub unit_type: Option<String>,
    pub source: Option<String>,
    pub sms_opt_in: Option<String>,
}
