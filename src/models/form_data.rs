use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::json::to_snake_case;

/// Name reported when the body itself cannot be bound
pub const BODY_FIELD: &str = "body";

/// Field failures in the order the fields are declared on [`FormData`]
pub type FieldErrors = Vec<(String, Vec<String>)>;

/// User registration payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FormData {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl FormData {
    /// Wire names of every field, in declaration order
    pub const FIELDS: [&'static str; 4] = ["email", "password", "first_name", "last_name"];

    /// Bind a JSON request body.
    ///
    /// Keys are matched after snake_case conversion, so `FirstName`,
    /// `firstName` and `first_name` all bind `first_name`. Every field is
    /// checked before returning; failures are reported under the key the
    /// client sent, or the field name when the key was missing.
    pub fn bind(body: &[u8]) -> Result<Self, FieldErrors> {
        let value: Value = serde_json::from_slice(body).map_err(|e| {
            vec![(
                BODY_FIELD.to_string(),
                vec![format!("The request body is not valid JSON: {}", e)],
            )]
        })?;

        match value {
            Value::Object(map) => Self::bind_object(map),
            _ => Err(vec![(
                BODY_FIELD.to_string(),
                vec!["The request body must be a JSON object.".to_string()],
            )]),
        }
    }

    fn bind_object(map: Map<String, Value>) -> Result<Self, FieldErrors> {
        // Later keys win when two spellings name the same field
        let mut supplied: HashMap<String, (String, Value)> = map
            .into_iter()
            .map(|(key, value)| (to_snake_case(&key), (key, value)))
            .collect();

        let mut sent_keys: HashMap<&'static str, String> = HashMap::new();
        let mut type_errors: HashMap<&'static str, String> = HashMap::new();
        let mut texts: HashMap<&'static str, String> = HashMap::new();

        for field in Self::FIELDS {
            let Some((key, value)) = supplied.remove(field) else {
                continue;
            };
            match value {
                // Blank strings count as missing
                Value::String(text) if !text.trim().is_empty() => {
                    texts.insert(field, text);
                }
                Value::String(_) | Value::Null => {}
                _ => {
                    type_errors.insert(field, format!("The {} field must be a string.", field));
                }
            }
            sent_keys.insert(field, key);
        }

        let draft = RegistrationDraft {
            email: texts.remove("email"),
            password: texts.remove("password"),
            first_name: texts.remove("first_name"),
            last_name: texts.remove("last_name"),
        };

        let mut rule_failures = match draft.validate() {
            Ok(()) => HashMap::new(),
            Err(errors) => messages_by_field(&errors),
        };

        let mut errors = FieldErrors::new();
        for field in Self::FIELDS {
            // A value of the wrong type is not also reported as missing
            let messages = match type_errors.remove(field) {
                Some(message) => vec![message],
                None => match rule_failures.remove(field) {
                    Some(messages) => messages,
                    None => continue,
                },
            };
            let name = sent_keys
                .remove(field)
                .unwrap_or_else(|| field.to_string());
            errors.push((name, messages));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            email: draft.email.unwrap_or_default(),
            password: draft.password.unwrap_or_default(),
            first_name: draft.first_name.unwrap_or_default(),
            last_name: draft.last_name.unwrap_or_default(),
        })
    }
}

/// Registration body after key matching, before validation
#[derive(Debug, Validate)]
struct RegistrationDraft {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field is not a valid e-mail address.")
    )]
    email: Option<String>,

    #[validate(required(message = "The password field is required."))]
    password: Option<String>,

    #[validate(required(message = "The first_name field is required."))]
    first_name: Option<String>,

    #[validate(required(message = "The last_name field is required."))]
    last_name: Option<String>,
}

fn messages_by_field(errors: &ValidationErrors) -> HashMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, failures)| {
            let messages = failures
                .iter()
                .map(|failure| match &failure.message {
                    Some(message) => message.to_string(),
                    None => failure.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn names(errors: &FieldErrors) -> Vec<&str> {
        errors.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[test]
    fn test_bind_snake_case_body() {
        let form = FormData::bind(&body(json!({
            "email": "ann@example.com",
            "password": "hunter22",
            "first_name": "Ann",
            "last_name": "Lee"
        })))
        .unwrap();

        assert_eq!(
            form,
            FormData {
                email: "ann@example.com".to_string(),
                password: "hunter22".to_string(),
                first_name: "Ann".to_string(),
                last_name: "Lee".to_string(),
            }
        );
    }

    #[test]
    fn test_bind_pascal_and_camel_case_keys() {
        let form = FormData::bind(&body(json!({
            "Email": "ann@example.com",
            "Password": "hunter22",
            "FirstName": "Ann",
            "lastName": "Lee",
            "Ignored": true
        })))
        .unwrap();

        assert_eq!(form.first_name, "Ann");
        assert_eq!(form.last_name, "Lee");
    }

    #[test]
    fn test_all_failures_are_reported_in_field_order() {
        let errors = FormData::bind(&body(json!({
            "LastName": "Lee",
            "Password": "hunter22",
        })))
        .unwrap_err();

        assert_eq!(names(&errors), vec!["email", "first_name"]);
        assert_eq!(errors[0].1, vec!["The email field is required.".to_string()]);
    }

    #[test]
    fn test_failures_use_the_key_the_client_sent() {
        let errors = FormData::bind(&body(json!({
            "FirstName": "   ",
            "Email": "not-an-address",
            "Password": 1234,
            "LastName": null
        })))
        .unwrap_err();

        assert_eq!(names(&errors), vec!["Email", "Password", "FirstName", "LastName"]);
        assert_eq!(
            errors[0].1,
            vec!["The email field is not a valid e-mail address.".to_string()]
        );
        assert_eq!(errors[1].1, vec!["The password field must be a string.".to_string()]);
        assert_eq!(errors[2].1, vec!["The first_name field is required.".to_string()]);
        assert_eq!(errors[3].1, vec!["The last_name field is required.".to_string()]);
    }

    #[test]
    fn test_malformed_and_non_object_bodies() {
        let errors = FormData::bind(b"{not json").unwrap_err();
        assert_eq!(names(&errors), vec![BODY_FIELD]);

        let errors = FormData::bind(b"[1, 2, 3]").unwrap_err();
        assert_eq!(
            errors,
            vec![(
                "body".to_string(),
                vec!["The request body must be a JSON object.".to_string()]
            )]
        );
    }
}
