use crate::model::{UpstreamErrorBody, ValidationErrorBody};
use crate::nvd::FeedError;
use actix_web::body::BoxBody;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::DbErr;
use vigil_common::error::ErrorInformation;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Upstream(#[from] FeedError),
    #[error("invalid request: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },
    #[error(transparent)]
    Database(anyhow::Error),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

impl From<DbErr> for Error {
    fn from(value: DbErr) -> Self {
        Self::Database(value.into())
    }
}

impl ResponseError for Error {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        match self {
            Self::Upstream(err) => HttpResponse::BadGateway().json(UpstreamErrorBody {
                message: err.to_string(),
                upstream: FeedError::UPSTREAM.to_string(),
            }),
            Self::Validation { message, field } => {
                HttpResponse::BadRequest().json(ValidationErrorBody {
                    message: message.clone(),
                    field: field.clone(),
                })
            }
            Self::Database(err) => HttpResponse::InternalServerError()
                .json(ErrorInformation::new("Database error", err)),
            Self::Any(err) => {
                HttpResponse::InternalServerError().json(ErrorInformation::new("System", err))
            }
        }
    }
}
