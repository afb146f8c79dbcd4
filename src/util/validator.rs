use std::borrow::Cow;

use error_stack::Report;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Error)]
#[error("Invalid given data occurred")]
pub struct Wrapper;

pub trait IntoValidatorReport<T> {
    fn into_validator_report(self) -> error_stack::Result<T, Wrapper>;
}

impl<T> IntoValidatorReport<T> for Result<T, ValidationErrors> {
    fn into_validator_report(self) -> error_stack::Result<T, Wrapper> {
        self.map_err(|v| {
            fn read_errors<'a>(
                err: &'a ValidationErrors,
                fields_queue: &mut Vec<Cow<'a, str>>,
                mut report: Report<Wrapper>,
            ) -> Report<Wrapper> {
                for (field, kind) in err.errors() {
                    fields_queue.push(Cow::Borrowed(field));
                    match kind {
                        ValidationErrorsKind::Struct(inner) => {
                            report = read_errors(inner, fields_queue, report);
                        }
                        ValidationErrorsKind::List(list) => {
                            for (index, inner) in list {
                                fields_queue.push(Cow::Owned(index.to_string()));
                                report = read_errors(inner, fields_queue, report);
                                fields_queue.pop();
                            }
                        }
                        ValidationErrorsKind::Field(messages) => {
                            let field_str = fields_queue.join(".");
                            for message in messages {
                                report = report.attach_printable(format!("{field_str}: {message}"));
                            }
                        }
                    }
                    fields_queue.pop();
                }
                report
            }

            let mut queue = Vec::new();
            let report = Report::new(Wrapper);
            read_errors(&v, &mut queue, report)
        })
    }
}

/// Collects field errors for hand-written [`validator::Validate`]
/// implementations, so every violated field is reported at once.
#[derive(Debug, Default)]
pub struct FieldErrors {
    inner: ValidationErrors,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &'static str, code: &'static str, message: impl Into<Cow<'static, str>>) {
        let mut error = ValidationError::new(code);
        error.message = Some(message.into());
        self.inner.add(field, error);
    }

    /// Checks the character length of an optional text field.
    pub fn check_length(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        min: usize,
        max: usize,
    ) {
        let Some(value) = value else { return };
        let len = value.chars().count();
        if len < min || len > max {
            self.insert(
                field,
                "length",
                format!("must be between {min} and {max} characters long"),
            );
        }
    }

    /// Requires a value to be present.
    pub fn check_required<T>(&mut self, field: &'static str, value: Option<&T>) {
        if value.is_none() {
            self.insert(field, "required", "This field is required");
        }
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.inner.errors().is_empty() {
            Ok(())
        } else {
            Err(self.inner)
        }
    }
}

/// Error for a required field that was left out.
#[must_use]
pub fn missing(field: &'static str) -> ValidationErrors {
    single_error(field, "required", "This field is required")
}

/// Builds a single-field validation error, used when an extractor
/// rejects the request before any payload validation runs.
#[must_use]
pub fn single_error(field: &'static str, code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationErrors {
    let mut errors = FieldErrors::new();
    errors.insert(field, code, message);
    errors.inner
}
