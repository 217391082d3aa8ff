pub mod form_data;

pub use form_data::{FieldErrors, FormData};
