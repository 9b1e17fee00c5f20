use std::collections::BTreeMap;

use aide::OperationIo;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::{IntoResponse, Redirect},
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;
use tower_governor::GovernorError;

use crate::{
	route::{auth, posts},
	session,
};

/// Field-level validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Error type for the application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error, OperationIo)]
#[aide(output_with = "axum_jsonschema::Json<ErrorResponse>")]
pub enum Error {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] rejection::JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("unknown route")]
	UnknownRoute,
	#[error("login required for {0}")]
	LoginRequired(String),
	#[error("rate limited")]
	RateLimit(#[from] GovernorError),
	#[error("auth error: {0}")]
	Auth(#[from] auth::Error),
	#[error("post error: {0}")]
	Post(#[from] posts::Error),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

/// Errors raised by a single area of the API decide their own
/// status code and client-facing messages.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<String> {
		vec![self.to_string()]
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<String>,
}

/// Flattens validation errors into messages grouped by field.
pub fn field_errors(errors: &validator::ValidationErrors) -> FieldErrors {
	errors
		.field_errors()
		.into_iter()
		.map(|(field, errors)| {
			let messages = errors
				.iter()
				.map(|error| {
					error
						.message
						.as_ref()
						.map_or_else(|| error.code.to_string(), ToString::to_string)
				})
				.collect();

			(field.to_string(), messages)
		})
		.collect()
}

fn respond(status: StatusCode, errors: Vec<String>) -> Response<Body> {
	(
		status,
		Json(ErrorResponse {
			success: false,
			errors,
		}),
	)
		.into_response()
}

fn shaped(error: &impl ErrorShape) -> Response<Body> {
	respond(error.status(), error.errors())
}

impl IntoResponse for Error {
	fn into_response(self) -> Response<Body> {
		match self {
			Error::Validation(errors) => respond(
				StatusCode::BAD_REQUEST,
				field_errors(&errors)
					.into_iter()
					.flat_map(|(field, messages)| {
						messages
							.into_iter()
							.map(move |message| format!("{field}: {message}"))
					})
					.collect(),
			),
			Error::Json(error) => respond(StatusCode::BAD_REQUEST, vec![error.body_text()]),
			Error::Query(error) => respond(StatusCode::BAD_REQUEST, vec![error.body_text()]),
			Error::UnknownRoute => respond(StatusCode::NOT_FOUND, vec!["unknown route".into()]),
			Error::LoginRequired(next) => Redirect::to(&session::login_url(&next)).into_response(),
			Error::RateLimit(GovernorError::TooManyRequests { .. }) => respond(
				StatusCode::TOO_MANY_REQUESTS,
				vec!["too many requests".into()],
			),
			Error::Auth(error) => shaped(&error),
			Error::Post(error) => shaped(&error),
			error => {
				tracing::error!(%error, "request failed");

				respond(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
			}
		}
	}
}

/// Responds to requests that match no route.
pub async fn not_found() -> Error {
	Error::UnknownRoute
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::*;

	#[derive(Validate)]
	struct Input {
		#[validate(length(min = 3, message = "too short"))]
		name: String,
		#[validate(range(min = 1))]
		size: i64,
	}

	#[test]
	fn test_field_errors() {
		let errors = Input {
			name: "a".into(),
			size: 0,
		}
		.validate()
		.unwrap_err();

		let errors = field_errors(&errors);

		assert_eq!(errors["name"], vec!["too short".to_string()]);
		assert_eq!(errors["size"], vec!["range".to_string()]);
	}

	#[test]
	fn test_login_required_redirects() {
		let response = Error::LoginRequired("/create/".into()).into_response();

		assert_eq!(response.status(), StatusCode::SEE_OTHER);
		assert_eq!(
			response.headers()["location"],
			session::login_url("/create/").as_str()
		);
	}

	#[test]
	fn test_unknown_route_status() {
		assert_eq!(
			Error::UnknownRoute.into_response().status(),
			StatusCode::NOT_FOUND
		);
	}
}
