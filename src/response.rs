use aide::{OperationIo, OperationOutput};
use axum::{
	body::Body,
	http::{Response, StatusCode},
	response::IntoResponse,
};
use serde::Serialize;

use crate::extract::Json;

/// A `303 See Other` to another page of the site.
///
/// Documented per route with `#[route(redirect(...))]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect(pub String);

impl Redirect {
	pub fn to(path: impl Into<String>) -> Self {
		Self(path.into())
	}
}

impl IntoResponse for Redirect {
	fn into_response(self) -> Response<Body> {
		axum::response::Redirect::to(&self.0).into_response()
	}
}

impl OperationOutput for Redirect {
	type Inner = ();
}

/// The outcome of showing or submitting a form.
///
/// Invalid submissions re-display the form with a `400 Bad Request`
/// so that the submitted input and its errors reach the client together.
#[derive(Debug, OperationIo)]
#[aide(output_with = "axum_jsonschema::Json<T>", json_schema)]
pub enum FormResponse<T> {
	Show(T),
	Invalid(T),
	Redirect(Redirect),
}

impl<T> IntoResponse for FormResponse<T>
where
	T: Serialize,
{
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Show(page) => Json(page).into_response(),
			Self::Invalid(page) => (StatusCode::BAD_REQUEST, Json(page)).into_response(),
			Self::Redirect(redirect) => redirect.into_response(),
		}
	}
}

impl<T> From<Redirect> for FormResponse<T> {
	fn from(redirect: Redirect) -> Self {
		Self::Redirect(redirect)
	}
}
