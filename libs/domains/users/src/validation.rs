//! Input normalization and validation.
//!
//! Every entry point reports all violated fields at once, sorted by field
//! name, one message per field.

use std::borrow::Cow;

use axum_helpers::FieldViolation;
use chrono::{DateTime, Utc};
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{
    CreateUser, DEFAULT_LIMIT, DEFAULT_PAGE, ListParams, ListQuery, MAX_LIMIT, NewUser,
    SortDirection, SortField, SortSpec, UpdateUser, User, UserChanges, UserStatus,
};

const STATUS_MESSAGE: &str = "Status must be one of: active, inactive, pending";
const NAME_TYPE_MESSAGE: &str = "Name must be a string";
const EMAIL_TYPE_MESSAGE: &str = "Email must be a string";
const AGE_TYPE_MESSAGE: &str = "Age must be an integer";

/// Candidate user fields, checked as a whole
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct UserDraft {
    #[validate(
        required(message = "Name is required"),
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Please provide a valid email address")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "Age is required"),
        range(min = 1, max = 120, message = "Age must be between 1 and 120")
    )]
    pub age: Option<i64>,

    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,

    /// Fields sent with the wrong JSON type; these replace any rule failure
    /// of the same field.
    pub type_violations: Vec<FieldViolation>,
}

fn validate_status(status: &str) -> Result<(), ValidationError> {
    if status.parse::<UserStatus>().is_err() {
        return Err(ValidationError::new("status").with_message(Cow::Borrowed(STATUS_MESSAGE)));
    }
    Ok(())
}

impl UserDraft {
    /// Trim text fields and lowercase the email.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|name| name.trim().to_string()),
            email: self.email.map(|email| email.trim().to_lowercase()),
            age: self.age,
            status: self.status.map(|status| status.trim().to_string()),
            type_violations: self.type_violations,
        }
    }

    /// Violations of the normalized draft; empty when valid.
    pub fn violations(&self) -> Vec<FieldViolation> {
        let mut out = self.type_violations.clone();
        if let Err(errors) = self.validate() {
            out.extend(
                violations(&errors)
                    .into_iter()
                    .filter(|v| !self.type_violations.iter().any(|t| t.field == v.field)),
            );
        }
        out.sort_by(|a, b| a.field.cmp(&b.field));
        out
    }

    /// Normalize, validate and convert, defaulting the status to `pending`.
    pub fn into_new_user(self) -> Result<NewUser, Vec<FieldViolation>> {
        let draft = self.normalized();
        let violations = draft.violations();
        if !violations.is_empty() {
            return Err(violations);
        }

        let status = draft
            .status
            .as_deref()
            .and_then(|status| status.parse::<UserStatus>().ok())
            .unwrap_or_default();
        let age = draft.age.and_then(|age| i32::try_from(age).ok());

        match (draft.name, draft.email, age) {
            (Some(name), Some(email), Some(age)) => Ok(NewUser {
                name,
                email,
                age,
                status,
            }),
            _ => Err(vec![FieldViolation::new("body", "Missing required fields")]),
        }
    }
}

impl From<CreateUser> for UserDraft {
    fn from(input: CreateUser) -> Self {
        let mut mistyped = Vec::new();
        Self {
            name: text_field("name", input.name, NAME_TYPE_MESSAGE, &mut mistyped),
            email: text_field("email", input.email, EMAIL_TYPE_MESSAGE, &mut mistyped),
            age: integer_field("age", input.age, &mut mistyped),
            status: text_field("status", input.status, STATUS_MESSAGE, &mut mistyped),
            type_violations: mistyped,
        }
    }
}

/// Take a JSON string, recording `message` for any other type.
fn text_field(
    field: &str,
    value: Option<Value>,
    message: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    match value {
        None => None,
        Some(Value::String(text)) => Some(text),
        Some(_) => {
            violations.push(FieldViolation::new(field, message));
            None
        }
    }
}

/// Take a JSON integer. Strings, fractions and out-of-range numbers are
/// type violations.
fn integer_field(
    field: &str,
    value: Option<Value>,
    violations: &mut Vec<FieldViolation>,
) -> Option<i64> {
    match value {
        None => None,
        Some(Value::Number(number)) if number.is_i64() => number.as_i64(),
        Some(_) => {
            violations.push(FieldViolation::new(field, AGE_TYPE_MESSAGE));
            None
        }
    }
}

impl UpdateUser {
    /// Field names present in the body.
    pub fn present_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.age.is_some() {
            fields.push("age");
        }
        if self.email.is_some() {
            fields.push("email");
        }
        if self.name.is_some() {
            fields.push("name");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        fields
    }

    /// Validate the present fields merged onto `existing` and keep only
    /// those as changes.
    ///
    /// Only present fields are reported, so a stored value that no longer
    /// satisfies the rules does not block updates of other fields.
    pub fn into_changes(
        self,
        existing: &User,
        now: DateTime<Utc>,
    ) -> Result<UserChanges, Vec<FieldViolation>> {
        let present = self.present_fields();
        let status_is_null = self.status == Some(None);
        let mut mistyped = Vec::new();

        let name = match self.name {
            Some(value) => text_field("name", value, NAME_TYPE_MESSAGE, &mut mistyped),
            None => Some(existing.name.clone()),
        };
        let email = match self.email {
            Some(value) => text_field("email", value, EMAIL_TYPE_MESSAGE, &mut mistyped),
            None => Some(existing.email.clone()),
        };
        let age = match self.age {
            Some(value) => integer_field("age", value, &mut mistyped),
            None => Some(i64::from(existing.age)),
        };
        let status = match self.status {
            Some(value) => text_field("status", value, STATUS_MESSAGE, &mut mistyped),
            None => Some(existing.status.to_string()),
        };

        let draft = UserDraft {
            name,
            email,
            age,
            status,
            type_violations: mistyped,
        }
        .normalized();

        let mut violations: Vec<FieldViolation> = draft
            .violations()
            .into_iter()
            .filter(|v| present.contains(&v.field.as_str()))
            .collect();
        if status_is_null {
            violations.push(FieldViolation::new("status", STATUS_MESSAGE));
            violations.sort_by(|a, b| a.field.cmp(&b.field));
        }
        if !violations.is_empty() {
            return Err(violations);
        }

        let mut changes = UserChanges::new(now);
        if present.contains(&"name") {
            changes.name = draft.name;
        }
        if present.contains(&"email") {
            changes.email = draft.email;
        }
        if present.contains(&"age") {
            changes.age = draft.age.and_then(|age| i32::try_from(age).ok());
        }
        if present.contains(&"status") {
            changes.status = draft
                .status
                .as_deref()
                .and_then(|status| status.parse::<UserStatus>().ok());
        }
        Ok(changes)
    }
}

impl ListQuery {
    /// Parse the raw query, applying defaults and clamping.
    ///
    /// - `page`/`limit` of 0 become 1, `limit` is capped at 100
    /// - non-numeric numbers, unknown status or sort fields are violations
    pub fn parse(&self) -> Result<ListParams, Vec<FieldViolation>> {
        let mut violations = Vec::new();

        let page = parse_positive(
            "page",
            self.page.as_deref(),
            DEFAULT_PAGE,
            "Page must be a positive integer",
            &mut violations,
        );
        let limit = parse_positive(
            "limit",
            self.limit.as_deref(),
            DEFAULT_LIMIT,
            "Limit must be a positive integer",
            &mut violations,
        )
        .min(MAX_LIMIT);

        let status = match non_blank(self.status.as_deref()) {
            None => None,
            Some(raw) => match raw.parse::<UserStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    violations.push(FieldViolation::new("status", STATUS_MESSAGE));
                    None
                }
            },
        };

        let sort = match non_blank(self.sort.as_deref()) {
            None => SortSpec::default(),
            Some(raw) => parse_sort(raw).unwrap_or_else(|violation| {
                violations.push(violation);
                SortSpec::default()
            }),
        };

        if !violations.is_empty() {
            violations.sort_by(|a, b| a.field.cmp(&b.field));
            return Err(violations);
        }

        Ok(ListParams {
            page,
            limit,
            status,
            sort,
        })
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_positive(
    field: &str,
    raw: Option<&str>,
    default: u64,
    message: &str,
    violations: &mut Vec<FieldViolation>,
) -> u64 {
    match non_blank(raw) {
        None => default,
        Some(value) => match value.parse::<u64>() {
            Ok(n) => n.max(1),
            Err(_) => {
                violations.push(FieldViolation::new(field, message));
                default
            }
        },
    }
}

/// Parse `"-age,name"` / `"-age name"` style sort specifiers.
///
/// Repeated fields keep their first occurrence.
pub fn parse_sort(raw: &str) -> Result<SortSpec, FieldViolation> {
    let mut keys: Vec<(SortField, SortDirection)> = Vec::new();

    for token in raw.split([',', ' ']).map(str::trim).filter(|t| !t.is_empty()) {
        let (direction, name) = if let Some(name) = token.strip_prefix('-') {
            (SortDirection::Descending, name)
        } else if let Some(name) = token.strip_prefix('+') {
            (SortDirection::Ascending, name)
        } else {
            (SortDirection::Ascending, token)
        };

        let field = name.parse::<SortField>().map_err(|_| {
            FieldViolation::new(
                "sort",
                format!(
                    "Unknown sort field '{}'; allowed: name, email, age, status, createdAt, updatedAt",
                    name
                ),
            )
        })?;

        if !keys.iter().any(|(existing, _)| *existing == field) {
            keys.push((field, direction));
        }
    }

    if keys.is_empty() {
        return Ok(SortSpec::default());
    }
    Ok(SortSpec(keys))
}

/// Flatten validator errors to one message per field, sorted by field.
pub fn violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut out: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                FieldViolation::new(field.to_string(), message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}
