//! Transport-layer types shared by the handlers: the typed forms accepted by
//! the API and the structured field-error set their validation produces.

pub mod errors;
pub mod forms;

pub use errors::{FieldErrors, validate_form};
pub use forms::{
    LoginForm, ProfilePkForm, ProfileUpdateForm, ProfileUpdateRequest, RegisterForm, ReportForm,
    UserUpdateForm,
};
