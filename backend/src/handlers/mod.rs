//! HTTP request handlers

pub mod advisory;
pub mod forecast;
pub mod geocode;

use validator::Validate;

use crate::error::AppError;

/// Run derive-based validation and surface the first failure as a field
/// error.
pub fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    request.validate().map_err(|errors| {
        let (field, error) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| (field.to_string(), errs.first().cloned()))
            .unwrap_or_else(|| ("request".to_string(), None));
        let message = error
            .and_then(|e| e.message.map(|m| m.to_string()))
            .unwrap_or_else(|| "invalid value".to_string());
        AppError::Validation { field, message }
    })
}
