use heck::ToSnakeCase;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// No identifier was supplied to convert
    #[error("identifier must not be absent")]
    MissingIdentifier,
}

/// Maps a property name to the name it is written under.
///
/// Implemented by [`SnakeCase`] and by any `Fn(&str) -> String`, so a
/// serializer call can take either a named policy or an ad hoc closure.
pub trait NamingPolicy {
    fn convert_name(&self, name: &str) -> String;
}

impl<F> NamingPolicy for F
where
    F: Fn(&str) -> String,
{
    fn convert_name(&self, name: &str) -> String {
        self(name)
    }
}

/// Naming policy producing lower snake_case
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCase;

impl NamingPolicy for SnakeCase {
    fn convert_name(&self, name: &str) -> String {
        to_snake_case(name)
    }
}

/// Convert an identifier that may be absent.
///
/// Present identifiers always convert; `None` is rejected.
pub fn convert(identifier: Option<&str>) -> Result<String, NamingError> {
    identifier
        .map(to_snake_case)
        .ok_or(NamingError::MissingIdentifier)
}

/// Convert a PascalCase or camelCase identifier to snake_case.
///
/// Acronym runs stay together (`HTTPServer` becomes `http_server`), digits
/// stay attached to the word before them, and spaces start a new word.
/// Input that is already snake_case comes back unchanged.
pub fn to_snake_case(identifier: &str) -> String {
    ToSnakeCase::to_snake_case(identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_words() {
        assert_eq!(to_snake_case("Email"), "email");
        assert_eq!(to_snake_case("FirstName"), "first_name");
        assert_eq!(to_snake_case("firstName"), "first_name");
        assert_eq!(to_snake_case("RequestId"), "request_id");
    }

    #[test]
    fn test_acronyms() {
        assert_eq!(to_snake_case("UserID"), "user_id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("ID"), "id");
        assert_eq!(to_snake_case("parseURLValue"), "parse_url_value");
    }

    #[test]
    fn test_digits_and_single_letters() {
        assert_eq!(to_snake_case("Address1Line"), "address1_line");
        assert_eq!(to_snake_case("Line2"), "line2");
        assert_eq!(to_snake_case("A"), "a");
        assert_eq!(to_snake_case("aB"), "a_b");
        assert_eq!(to_snake_case("IsAValue"), "is_a_value");
        assert_eq!(to_snake_case("HTTP2Server"), "http2_server");
        assert_eq!(to_snake_case("UserID2"), "user_id2");
    }

    #[test]
    fn test_spaces_start_new_words() {
        assert_eq!(to_snake_case("First Name"), "first_name");
        assert_eq!(to_snake_case("first name"), "first_name");
        assert_eq!(to_snake_case(" Leading"), "leading");
    }

    #[test]
    fn test_empty_and_snake_case_passthrough() {
        assert_eq!(to_snake_case(""), "");
        assert_eq!(to_snake_case("email"), "email");
        assert_eq!(to_snake_case("first_name"), "first_name");
        assert_eq!(to_snake_case("validation_errors"), "validation_errors");
    }

    #[test]
    fn test_conversion_is_idempotent() {
        for input in [
            "UserID",
            "HTTPServer",
            "FirstName",
            "lastName",
            "ValidationErrors",
            "Address1Line",
            "XMLHttpRequest",
            "HTTP2Server",
            "already_snake",
        ] {
            let once = to_snake_case(input);
            assert_eq!(to_snake_case(&once), once, "input: {}", input);
        }
    }

    #[test]
    fn test_convert_rejects_missing_identifier() {
        assert_eq!(convert(Some("LastName")), Ok("last_name".to_string()));
        assert_eq!(convert(Some("")), Ok(String::new()));
        assert_eq!(convert(None), Err(NamingError::MissingIdentifier));
    }

    #[test]
    fn test_closure_is_a_naming_policy() {
        let upper = |name: &str| name.to_uppercase();
        assert_eq!(upper.convert_name("email"), "EMAIL");
        assert_eq!(SnakeCase.convert_name("LastName"), "last_name");
    }
}
