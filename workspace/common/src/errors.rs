use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

/// Field-level validation messages keyed by field name.
///
/// Serializes as a plain JSON object: `{"username": ["..."], "email": ["..."]}`.
/// Errors coming from nested forms are keyed as `form.field`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Moves every error of `other` into `self`, keyed as `prefix.field`.
    pub fn merge_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0
                .entry(format!("{}.{}", prefix, field))
                .or_default()
                .extend(messages);
        }
    }

    /// `Ok(())` when no error was collected.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors = FieldErrors::new();
        for (field, errors) in errors.field_errors() {
            for error in errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                field_errors.add(field.to_string(), message);
            }
        }
        field_errors
    }
}

/// Runs the derived validation rules of a form.
pub fn validate_form<T: Validate>(form: &T) -> Result<(), FieldErrors> {
    form.validate().map_err(|errors| {
        let errors = FieldErrors::from(errors);
        trace!("Form rejected with errors on {} fields", errors.0.len());
        errors
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.add("username", "first");
        errors.add("username", "second");
        errors.add("email", "bad");

        assert!(!errors.is_empty());
        assert_eq!(errors.get("username").unwrap().len(), 2);
        assert!(errors.contains("email"));
        assert!(!errors.contains("password1"));
    }

    #[test]
    fn test_merge_prefixed() {
        let mut inner = FieldErrors::new();
        inner.add("image", "unsupported");

        let mut outer = FieldErrors::new();
        outer.merge_prefixed("profile", inner);

        assert_eq!(outer.get("profile.image").unwrap(), &vec!["unsupported".to_string()]);
        assert!(outer.into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut errors = FieldErrors::new();
        errors.add("email", "Enter a valid email address.");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["email"][0], "Enter a valid email address.");
    }
}
