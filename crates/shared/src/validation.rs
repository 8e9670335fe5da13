//! Schema rules shared by the browser-side form controller and the server.
//!
//! Both sides run the same rules; only the server's verdict is trusted.

use email_address::{EmailAddress, Options};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    domain::{BudgetBracket, ContactKind, ContactSubmission, FormKind, ProposalSubmission},
    error::{FieldErrors, ValidationError},
};

/// Key used for errors that do not belong to a single field.
pub const FORM_FIELD: &str = "_form";

pub const NAME_CHARS: (usize, usize) = (2, 100);
pub const SUBJECT_CHARS: (usize, usize) = (3, 200);
pub const MESSAGE_CHARS: (usize, usize) = (10, 5000);
pub const COMPANY_MAX_CHARS: usize = 100;
pub const DESCRIPTION_CHARS: (usize, usize) = (20, 10000);

pub trait Submission: Serialize + Sized + Send + Sync + 'static {
    const FORM: FormKind;

    /// Parses and validates an untrusted JSON document.
    fn from_json(value: &Value) -> Result<Self, ValidationError>;

    /// Re-runs the schema against an already typed value.
    fn validate(&self) -> Result<(), ValidationError> {
        let value = serde_json::to_value(self)
            .map_err(|err| ValidationError::single(FORM_FIELD, err.to_string()))?;
        Self::from_json(&value).map(|_| ())
    }
}

impl Submission for ContactSubmission {
    const FORM: FormKind = FormKind::Contact;

    fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(value);
        let name = reader.text("name", NAME_CHARS);
        let email = reader.email("email");
        let subject = reader.text("subject", SUBJECT_CHARS);
        let kind = reader.choice("type", &ContactKind::ALL, ContactKind::as_str);
        let message = reader.text("message", MESSAGE_CHARS);
        reader.finish()?;

        match (name, email, subject, kind, message) {
            (Some(name), Some(email), Some(subject), Some(kind), Some(message)) => Ok(Self {
                name,
                email,
                subject,
                kind,
                message,
            }),
            _ => Err(ValidationError::single(FORM_FIELD, "Invalid input")),
        }
    }
}

impl Submission for ProposalSubmission {
    const FORM: FormKind = FormKind::Proposal;

    fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let mut reader = FieldReader::new(value);
        let name = reader.text("name", NAME_CHARS);
        let email = reader.email("email");
        let company = reader.optional_text("company", COMPANY_MAX_CHARS);
        let budget = reader.choice("budget", &BudgetBracket::ALL, BudgetBracket::as_str);
        let deadline = reader.text("deadline", (1, usize::MAX));
        let description = reader.text("description", DESCRIPTION_CHARS);
        reader.finish()?;

        match (name, email, company, budget, deadline, description) {
            (
                Some(name),
                Some(email),
                Some(company),
                Some(budget),
                Some(deadline),
                Some(description),
            ) => Ok(Self {
                name,
                email,
                company,
                budget,
                deadline,
                description,
            }),
            _ => Err(ValidationError::single(FORM_FIELD, "Invalid input")),
        }
    }
}

struct FieldReader<'a> {
    fields: Option<&'a Map<String, Value>>,
    errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
    fn new(value: &'a Value) -> Self {
        let mut reader = Self {
            fields: value.as_object(),
            errors: FieldErrors::new(),
        };
        if reader.fields.is_none() {
            reader.reject(
                FORM_FIELD,
                format!("Expected object, received {}", json_type(value)),
            );
        }
        reader
    }

    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.errors))
        }
    }

    fn string(&mut self, field: &str) -> Option<String> {
        let value = match self.fields?.get(field) {
            Some(value) => value,
            None => {
                self.reject(field, "Required");
                return None;
            }
        };
        match value.as_str() {
            Some(text) => Some(text.to_string()),
            None => {
                self.reject(
                    field,
                    format!("Expected string, received {}", json_type(value)),
                );
                None
            }
        }
    }

    fn text(&mut self, field: &str, (min, max): (usize, usize)) -> Option<String> {
        let value = self.string(field)?;
        let len = text_len(&value);
        if len < min {
            self.reject(
                field,
                format!("String must contain at least {min} character(s)"),
            );
            return None;
        }
        if len > max {
            self.reject(
                field,
                format!("String must contain at most {max} character(s)"),
            );
            return None;
        }
        Some(value)
    }

    /// Absent, `null` and `""` all mean "not provided".
    fn optional_text(&mut self, field: &str, max: usize) -> Option<Option<String>> {
        if matches!(self.fields?.get(field), None | Some(Value::Null)) {
            return Some(None);
        }
        let value = self.string(field)?;
        if value.is_empty() {
            return Some(None);
        }
        if text_len(&value) > max {
            self.reject(
                field,
                format!("String must contain at most {max} character(s)"),
            );
            return None;
        }
        Some(Some(value))
    }

    fn email(&mut self, field: &str) -> Option<String> {
        let value = self.string(field)?;
        let plain = EmailAddress::parse_with_options(&value, email_options())
            .map(|address| !address.local_part().starts_with('"'))
            .unwrap_or(false);
        if !plain {
            self.reject(field, "Invalid email");
            return None;
        }
        Some(value)
    }

    fn choice<T: Copy>(
        &mut self,
        field: &str,
        allowed: &[T],
        as_str: fn(T) -> &'static str,
    ) -> Option<T> {
        let value = self.string(field)?;
        if let Some(found) = allowed.iter().copied().find(|item| as_str(*item) == value) {
            return Some(found);
        }
        let expected = allowed
            .iter()
            .map(|item| format!("'{}'", as_str(*item)))
            .collect::<Vec<_>>()
            .join(" | ");
        self.reject(
            field,
            format!("Invalid enum value. Expected {expected}, received '{value}'"),
        );
        None
    }
}

/// Bare `local@domain.tld` only: no display text, domain literals or quoted
/// local parts.
fn email_options() -> Options {
    Options::default()
        .without_display_text()
        .without_domain_literal()
        .with_required_tld()
}

/// Length in UTF-16 code units, the unit browsers use for form limits.
fn text_len(value: &str) -> usize {
    value.encode_utf16().count()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
