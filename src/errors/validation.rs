use crate::json::to_snake_case;

use super::details::{ValidationError, ValidationProblemDetails};

/// Flatten `(field, messages)` reports into one [`ValidationError`] per
/// message, with field names converted to snake_case.
///
/// Output follows the order fields were reported in, then message order
/// within a field. Fields reported with no messages contribute nothing.
pub fn collect_validation_errors<I, N, M, S>(fields: I) -> Vec<ValidationError>
where
    I: IntoIterator<Item = (N, M)>,
    N: AsRef<str>,
    M: IntoIterator<Item = S>,
    S: Into<String>,
{
    fields
        .into_iter()
        .flat_map(|(field, messages)| {
            let name = to_snake_case(field.as_ref());
            messages
                .into_iter()
                .map(move |message| ValidationError::new(name.clone(), message))
        })
        .collect()
}

impl ValidationProblemDetails {
    /// Build the 400 body for a set of field reports
    pub fn from_field_errors<I, N, M, S>(instance: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (N, M)>,
        N: AsRef<str>,
        M: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_instance(instance, collect_validation_errors(fields))
    }
}
