use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::model::timestamp_string;
use crate::document::validate::{is_valid_email, parse_object, require_json_content_type};
use crate::document::ValidationError;

/// Collection holding newsletter and contact submissions.
pub const LEADS_COLLECTION: &str = "subscribe";

const INVALID_EMAIL: &str = "Please enter a valid email address";
const MISSING_NAME: &str = "Please enter your name";
const MISSING_SLOT: &str = "Please select both a date and time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Newsletter,
    HomepageCta,
    GetStarted,
    ScheduleDemo,
}

/// A stored lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub source: LeadSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
    pub timestamp: String,
}

impl Lead {
    fn new(email: String, source: LeadSource, now: DateTime<Utc>) -> Self {
        Self {
            email,
            name: None,
            organization: None,
            phone: None,
            message: None,
            source,
            scheduled_date: None,
            scheduled_time: None,
            timestamp: timestamp_string(&now),
        }
    }

    pub fn into_content(self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// Newsletter sign-up from the modal or the home page call to action.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source: Option<LeadSource>,
}

impl SubscribeForm {
    pub fn into_lead(self, now: DateTime<Utc>) -> Result<Lead, ValidationError> {
        let email = valid_email(&self.email)?;
        let source = match self.source.unwrap_or(LeadSource::Newsletter) {
            source @ (LeadSource::Newsletter | LeadSource::HomepageCta) => source,
            _ => {
                return Err(invalid(
                    "source",
                    "newsletter sign-ups come from `newsletter` or `homepage_cta`",
                ))
            }
        };
        let mut lead = Lead::new(email, source, now);
        lead.name = non_blank(self.name);
        Ok(lead)
    }
}

/// "Get started" contact form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ContactForm {
    pub fn into_lead(self, source: LeadSource, now: DateTime<Utc>) -> Result<Lead, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid("name", MISSING_NAME));
        }
        let mut lead = Lead::new(valid_email(&self.email)?, source, now);
        lead.name = Some(name.to_string());
        lead.organization = non_blank(self.organization);
        lead.phone = non_blank(self.phone);
        lead.message = non_blank(self.message);
        Ok(lead)
    }
}

/// Demo booking: a contact form plus a date (`yyyy-MM-dd`) and time slot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoForm {
    #[serde(flatten)]
    pub contact: ContactForm,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub scheduled_time: Option<String>,
}

impl DemoForm {
    pub fn into_lead(self, now: DateTime<Utc>) -> Result<Lead, ValidationError> {
        let (Some(date), Some(time)) = (non_blank(self.scheduled_date), non_blank(self.scheduled_time)) else {
            return Err(invalid("scheduledDate", MISSING_SLOT));
        };
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| invalid("scheduledDate", "expected a date formatted yyyy-MM-dd"))?;

        let mut lead = self.contact.into_lead(LeadSource::ScheduleDemo, now)?;
        lead.scheduled_date = Some(date.format("%Y-%m-%d").to_string());
        lead.scheduled_time = Some(time);
        Ok(lead)
    }
}

/// Check the content type and decode a JSON object body into a form.
pub fn decode_form<T: DeserializeOwned>(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<T, ValidationError> {
    require_json_content_type(content_type)?;
    let object = parse_object(body)?;
    serde_json::from_value(Value::Object(object)).map_err(|e| invalid("payload", &e.to_string()))
}

fn valid_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if is_valid_email(email) {
        Ok(email.to_string())
    } else {
        Err(invalid("email", INVALID_EMAIL))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn invalid(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 9, 30, 0).unwrap()
    }

    fn reason(err: ValidationError) -> String {
        match err {
            ValidationError::InvalidField { reason, .. } => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn subscribe_defaults_to_newsletter() {
        let form: SubscribeForm = serde_json::from_value(json!({"email": " dana@vbcai.org "})).unwrap();
        let lead = form.into_lead(now()).unwrap();
        assert_eq!(lead.email, "dana@vbcai.org");
        assert_eq!(lead.source, LeadSource::Newsletter);
        assert_eq!(lead.name, None);
    }

    #[test]
    fn subscribe_rejects_bad_email_and_foreign_source() {
        let form: SubscribeForm = serde_json::from_value(json!({"email": "dana@"})).unwrap();
        assert_eq!(reason(form.into_lead(now()).unwrap_err()), INVALID_EMAIL);

        let form: SubscribeForm =
            serde_json::from_value(json!({"email": "dana@vbcai.org", "source": "schedule_demo"})).unwrap();
        assert!(form.into_lead(now()).is_err());

        let form: SubscribeForm =
            serde_json::from_value(json!({"email": "dana@vbcai.org", "source": "homepage_cta"})).unwrap();
        assert_eq!(form.into_lead(now()).unwrap().source, LeadSource::HomepageCta);
    }

    #[test]
    fn contact_requires_name_then_email() {
        let form = ContactForm {
            email: "nope".into(),
            ..ContactForm::default()
        };
        assert_eq!(
            reason(form.into_lead(LeadSource::GetStarted, now()).unwrap_err()),
            MISSING_NAME
        );

        let form = ContactForm {
            name: "Dana".into(),
            email: "nope".into(),
            ..ContactForm::default()
        };
        assert_eq!(
            reason(form.into_lead(LeadSource::GetStarted, now()).unwrap_err()),
            INVALID_EMAIL
        );
    }

    #[test]
    fn demo_needs_a_slot() {
        let form: DemoForm = serde_json::from_value(json!({
            "name": "Dana",
            "email": "dana@vbcai.org",
            "scheduledDate": "2025-03-10",
        }))
        .unwrap();
        assert_eq!(reason(form.into_lead(now()).unwrap_err()), MISSING_SLOT);

        let form: DemoForm = serde_json::from_value(json!({
            "name": "Dana",
            "email": "dana@vbcai.org",
            "scheduledDate": "03/10/2025",
            "scheduledTime": "10:00 AM",
        }))
        .unwrap();
        assert!(form.into_lead(now()).is_err());
    }

    #[test]
    fn demo_lead_serializes_for_storage() {
        let form: DemoForm = serde_json::from_value(json!({
            "name": "Dana",
            "email": "dana@vbcai.org",
            "organization": "Acme ACO",
            "phone": "  ",
            "scheduledDate": "2025-03-10",
            "scheduledTime": "10:00 AM",
        }))
        .unwrap();
        let content = form.into_lead(now()).unwrap().into_content().unwrap();
        assert_eq!(content["source"], json!("schedule_demo"));
        assert_eq!(content["scheduledDate"], json!("2025-03-10"));
        assert_eq!(content["organization"], json!("Acme ACO"));
        assert!(!content.contains_key("phone"));
        assert!(content["timestamp"].as_str().unwrap().starts_with("2025-03-04T09:30:00"));
    }

    #[test]
    fn decode_form_checks_content_type() {
        let body = br#"{"email":"dana@vbcai.org"}"#;
        assert!(decode_form::<SubscribeForm>(Some("application/json"), body).is_ok());
        assert!(matches!(
            decode_form::<SubscribeForm>(Some("text/html"), body),
            Err(ValidationError::ContentType(_))
        ));
        assert!(matches!(
            decode_form::<SubscribeForm>(Some("application/json"), br#"{"source":"fax"}"#),
            Err(ValidationError::InvalidField { .. })
        ));
    }
}
