use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::{AuthBlock, AuthMode};
use crate::config::UpstreamMethod;
use crate::errors::AppError;
use crate::lead_models::Lead;
use crate::normalize::{backdated_timestamp, coerce_opt_in, normalize_date};

/// Entrata echoes this back; it has no meaning beyond correlation.
pub const REQUEST_ID: &str = "15";

/// Full request body POSTed to the Entrata leads endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedLeadPayload {
    pub auth: AuthBlock,
    pub request_id: &'static str,
    pub method: MethodDescriptor,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    pub params: LeadParams,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LeadParams {
    SendLeads(SendLeadsParams),
    CreateLead(CreateLeadParams),
}

/// `sendLeads` parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLeadsParams {
    pub property_id: u64,
    pub do_not_send_confirmation_email: &'static str,
    pub is_wait_list: &'static str,
    pub prospects: Prospects,
}

#[derive(Debug, Clone, Serialize)]
pub struct Prospects {
    pub prospect: Vec<Prospect>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_source: Option<LeadSource>,
    pub created_date: String,
    pub customers: Customers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_preferences: Option<CustomerPreferences>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadSource {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Customers {
    pub customer: Vec<Customer>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: CustomerName,
    pub phone: CustomerPhone,
    pub email: String,
    pub marketing_preferences: MarketingPreferences,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerName {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPhone {
    pub personal_phone_number: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingPreferences {
    pub opt_in_sms: &'static str,
}

/// Optional prospect preferences. Absent fields are omitted, never faked.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_move_in_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_num_bedrooms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_num_bathrooms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_unit_type: Option<String>,
}

impl CustomerPreferences {
    fn is_empty(&self) -> bool {
        self.desired_move_in_date.is_none()
            && self.comment.is_none()
            && self.desired_num_bedrooms.is_none()
            && self.desired_num_bathrooms.is_none()
            && self.desired_unit_type.is_none()
    }
}

/// `createLead` parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadParams {
    pub property_id: u64,
    pub name: String,
    pub telephone: String,
    pub email: String,
}

/// Parses the property identifier Entrata expects as a number.
pub fn parse_property_id(raw: &str) -> Result<u64, AppError> {
    raw.trim().parse::<u64>().map_err(|_| {
        AppError::BadRequest(format!("propertyId must be numeric, got '{}'", raw))
    })
}

impl NormalizedLeadPayload {
    /// Maps a validated lead onto the Entrata schema for `method`.
    ///
    /// `default_source` fills the lead source when the form sent none;
    /// `now` is the reference instant for the backdated creation date.
    pub fn build(
        lead: &Lead,
        auth: &AuthMode,
        method: UpstreamMethod,
        default_source: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let property_id = parse_property_id(&lead.property_id)?;

        let params = match method {
            UpstreamMethod::SendLeads => {
                LeadParams::SendLeads(send_leads_params(lead, property_id, default_source, now))
            }
            UpstreamMethod::CreateLead => LeadParams::CreateLead(CreateLeadParams {
                property_id,
                name: format!("{} {}", lead.first_name, lead.last_name),
                telephone: lead.phone.clone(),
                email: lead.email.clone(),
            }),
        };

        Ok(Self {
            auth: auth.auth_block(),
            request_id: REQUEST_ID,
            method: MethodDescriptor {
                name: method.name(),
                version: method.version(),
                params,
            },
        })
    }
}

fn send_leads_params(
    lead: &Lead,
    property_id: u64,
    default_source: Option<&str>,
    now: DateTime<Utc>,
) -> SendLeadsParams {
    let lead_source = lead
        .source
        .as_deref()
        .or(default_source)
        .map(|name| LeadSource {
            name: name.to_string(),
        });

    let preferences = CustomerPreferences {
        desired_move_in_date: lead
            .move_in_date
            .as_deref()
            .map(normalize_date)
            .filter(|date| !date.is_empty()),
        comment: lead.notes.clone(),
        desired_num_bedrooms: lead.bedrooms.clone(),
        desired_num_bathrooms: lead.bathrooms.clone(),
        desired_unit_type: lead.unit_type.clone(),
    };

    let customer = Customer {
        name: CustomerName {
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
        },
        phone: CustomerPhone {
            personal_phone_number: lead.phone.clone(),
        },
        email: lead.email.clone(),
        marketing_preferences: MarketingPreferences {
            opt_in_sms: coerce_opt_in(lead.sms_opt_in.as_deref()),
        },
    };

    SendLeadsParams {
        property_id,
        do_not_send_confirmation_email: "1",
        is_wait_list: "0",
        prospects: Prospects {
            prospect: vec![Prospect {
                lead_source,
                created_date: backdated_timestamp(now),
                customers: Customers {
                    customer: vec![customer],
                },
                customer_preferences: (!preferences.is_empty()).then_some(preferences),
            }],
        },
    }
}
