use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::members::MemberError;
use crate::templates::TemplateError;

/// Shown instead of a page that could not be rendered.
pub const TEMPLATE_FAILURE_MESSAGE: &str = "There is something wrong with your template.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Member(#[from] MemberError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Template(e) => {
                tracing::error!("[http] render failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, TEMPLATE_FAILURE_MESSAGE).into_response()
            }
            AppError::Member(e) => {
                let status = match &e {
                    MemberError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                    MemberError::DuplicateEmail(_) => StatusCode::CONFLICT,
                    MemberError::NotFound(_) => StatusCode::NOT_FOUND,
                    MemberError::Database(_) => {
                        tracing::error!("[http] member store failed: {e}");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.to_string()).into_response()
            }
        }
    }
}
