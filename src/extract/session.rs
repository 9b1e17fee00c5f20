use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts, OriginalUri},
	http::{header, request},
};
use uuid::Uuid;

use crate::{error::Error, openapi::SECURITY_SCHEME_SESSION, route::auth, session, Database};

/// Extracts the session and related user from the request.
///
/// Anonymous requests are rejected with [`Error::LoginRequired`], which
/// redirects to the login page and carries the original path in `next`.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: auth::model::User,
}

/// The requesting user, if any.
///
/// Use this on pages that anyone can see but that show extra
/// information to authenticated users.
#[derive(Debug)]
pub struct Viewer(pub Option<Session>);

impl Viewer {
	pub fn user(&self) -> Option<&auth::model::User> {
		self.0.as_ref().map(|session| &session.user)
	}
}

/// Looks up the user owning the session cookie of the request, if any.
///
/// A missing, malformed or expired cookie is treated as an anonymous request.
async fn lookup<S>(parts: &request::Parts, state: &S) -> Result<Option<Session>, Error>
where
	Database: FromRef<S>,
{
	let cookies = parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok());

	let Some(session_id) = cookies
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == session::COOKIE_NAME)
		.and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
	else {
		return Ok(None);
	};

	let database = Database::from_ref(state);
	let user = sqlx::query_as::<_, auth::model::User>(
		r#"
			SELECT users.* FROM users
			JOIN sessions ON sessions.user_id = users.id
			WHERE sessions.id = ?
		"#,
	)
	.bind(session_id)
	.fetch_optional(&database)
	.await?;

	Ok(user.map(|user| Session {
		id: session_id,
		user,
	}))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		if let Some(session) = lookup(parts, state).await? {
			return Ok(session);
		}

		// Nested routers only see the remainder of the path.
		let uri = parts
			.extensions
			.get::<OriginalUri>()
			.map_or(&parts.uri, |original| &original.0);
		let next = uri
			.path_and_query()
			.map_or_else(|| uri.path().to_owned(), ToString::to_string);

		Err(Error::LoginRequired(next))
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Viewer
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		Ok(Self(lookup(parts, state).await?))
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a session cookie requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}

impl OperationInput for Viewer {}
