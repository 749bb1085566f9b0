//! Typed inputs accepted by the API together with their validation rules.
//!
//! Only rules that need nothing but the submitted values live here.
//! Checks against stored data (username already taken, unknown profile)
//! are done by the handlers and reported through the same [`FieldErrors`].

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::errors::{FieldErrors, validate_form};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Letters, digits and `@ . + - _` only.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if username.chars().all(allowed) {
        Ok(())
    } else {
        Err(error_with_message(
            "invalid_username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ))
    }
}

fn validate_not_numeric(password: &str) -> Result<(), ValidationError> {
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        Err(error_with_message(
            "password_entirely_numeric",
            "This password is entirely numeric.",
        ))
    } else {
        Ok(())
    }
}

fn validate_image_reference(image: &str) -> Result<(), ValidationError> {
    let extension = image
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase());
    match extension {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(error_with_message(
            "invalid_image",
            "Upload a valid image. Supported formats are jpg, jpeg, png and gif.",
        )),
    }
}

/// Registration form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct RegisterForm {
    /// Required. 150 characters or fewer. Letters, digits and @/./+/-/_ only.
    #[validate(
        length(min = 1, max = 150, message = "Ensure this value has at most 150 characters and is not empty."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(
        length(min = 8, message = "This password is too short. It must contain at least 8 characters."),
        custom(function = "validate_not_numeric")
    )]
    pub password1: String,
    /// Must repeat `password1`.
    #[validate(must_match(other = "password1", message = "The two password fields didn't match."))]
    pub password2: String,
}

/// Credentials exchanged for an access token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
}

/// Identity fields of the profile page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct UserUpdateForm {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this value has at most 150 characters and is not empty."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

/// Picture field of the profile page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct ProfileUpdateForm {
    /// Reference to the new picture, e.g. `avatars/me.png`.
    #[validate(
        length(min = 1, max = 255, message = "Ensure this value has at most 255 characters and is not empty."),
        custom(function = "validate_image_reference")
    )]
    pub image: String,
}

/// Both profile page forms, submitted together.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProfileUpdateRequest {
    pub user: UserUpdateForm,
    pub profile: ProfileUpdateForm,
}

impl ProfileUpdateRequest {
    /// Validates both forms independently and reports the errors of both.
    ///
    /// Errors are keyed `user.<field>` and `profile.<field>`.
    pub fn validate_all(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Err(user_errors) = validate_form(&self.user) {
            errors.merge_prefixed("user", user_errors);
        }
        if let Err(profile_errors) = validate_form(&self.profile) {
            errors.merge_prefixed("profile", profile_errors);
        }
        errors.into_result()
    }
}

/// Body of the relationship mutations: the other profile's primary key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ProfilePkForm {
    pub profile_pk: i32,
}

/// Abuse report submitted by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct ReportForm {
    pub reported_user_id: i32,
    #[validate(length(min = 1, max = 2000, message = "Ensure this value has at most 2000 characters and is not empty."))]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            username: "new.user+1".to_string(),
            email: "new@example.com".to_string(),
            password1: "s3cret-pass".to_string(),
            password2: "s3cret-pass".to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(validate_form(&register_form()).is_ok());
    }

    #[test]
    fn test_registration_field_errors() {
        let form = RegisterForm {
            username: "bad name!".to_string(),
            email: "not-an-email".to_string(),
            password1: "12345678".to_string(),
            password2: "87654321".to_string(),
        };

        let errors = validate_form(&form).unwrap_err();
        assert!(errors.contains("username"));
        assert!(errors.contains("email"));
        assert!(errors.contains("password1"));
        assert!(errors.contains("password2"));
        assert_eq!(
            errors.get("password1").unwrap(),
            &vec!["This password is entirely numeric.".to_string()]
        );
    }

    #[test]
    fn test_short_password() {
        let form = RegisterForm {
            password1: "short".to_string(),
            password2: "short".to_string(),
            ..register_form()
        };

        let errors = validate_form(&form).unwrap_err();
        assert!(errors.contains("password1"));
        assert!(!errors.contains("password2"));
    }

    #[test]
    fn test_username_length_limit() {
        let form = RegisterForm {
            username: "a".repeat(151),
            ..register_form()
        };
        assert!(validate_form(&form).unwrap_err().contains("username"));

        let form = RegisterForm {
            username: "a".repeat(150),
            ..register_form()
        };
        assert!(validate_form(&form).is_ok());
    }

    #[test]
    fn test_image_reference_extensions() {
        for image in ["me.jpg", "avatars/me.PNG", "x.jpeg", "anim.gif"] {
            let form = ProfileUpdateForm { image: image.to_string() };
            assert!(validate_form(&form).is_ok(), "{} should be accepted", image);
        }
        for image in ["me.exe", "noextension", ""] {
            let form = ProfileUpdateForm { image: image.to_string() };
            assert!(validate_form(&form).is_err(), "{} should be rejected", image);
        }
    }

    #[test]
    fn test_profile_update_reports_both_forms() {
        let request = ProfileUpdateRequest {
            user: UserUpdateForm {
                username: "fine".to_string(),
                email: "broken".to_string(),
            },
            profile: ProfileUpdateForm {
                image: "virus.exe".to_string(),
            },
        };

        let errors = request.validate_all().unwrap_err();
        assert!(errors.contains("user.email"));
        assert!(errors.contains("profile.image"));
        assert!(!errors.contains("user.username"));
    }

    #[test]
    fn test_profile_update_one_invalid_form_fails() {
        let request = ProfileUpdateRequest {
            user: UserUpdateForm {
                username: "fine".to_string(),
                email: "fine@example.com".to_string(),
            },
            profile: ProfileUpdateForm {
                image: "document.pdf".to_string(),
            },
        };

        let errors = request.validate_all().unwrap_err();
        assert_eq!(errors.0.len(), 1);
        assert!(errors.contains("profile.image"));
    }

    #[test]
    fn test_report_message_bounds() {
        let form = ReportForm {
            reported_user_id: 2,
            message: "x".repeat(2000),
        };
        assert!(validate_form(&form).is_ok());

        let form = ReportForm {
            reported_user_id: 2,
            message: "x".repeat(2001),
        };
        assert!(validate_form(&form).unwrap_err().contains("message"));

        let form = ReportForm {
            reported_user_id: 2,
            message: String::new(),
        };
        assert!(validate_form(&form).is_err());
    }
}
