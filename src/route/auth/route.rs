use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::{header, StatusCode},
};
use chrono::Utc;
use macros::route;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
	error::Error,
	extract::{Json, Query, Session, Viewer},
	openapi::tag,
	response::Redirect,
	session, AppState, Database,
};

use super::{model, Error as AuthError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Compares a stored hash with a fresh one without leaking where they differ.
fn password_matches(stored: &[u8], hashed: &[u8]) -> bool {
	stored.len() == hashed.len() && bool::from(stored.ct_eq(hashed))
}

/// Maps a unique constraint failure on `users` to the field that clashed.
fn signup_conflict(error: sqlx::Error) -> Error {
	match error {
		sqlx::Error::Database(ref d) if d.is_unique_violation() => {
			if d.message().contains("users.email") {
				AuthError::EmailTaken.into()
			} else {
				AuthError::UsernameTaken.into()
			}
		}
		error => error.into(),
	}
}

async fn start_session<'c, E>(executor: E, user_id: Uuid) -> Result<model::Session, sqlx::Error>
where
	E: sqlx::Executor<'c, Database = sqlx::Sqlite>,
{
	sqlx::query_as::<_, model::Session>(
		"INSERT INTO sessions (id, user_id, created_at) VALUES (?, ?, ?) RETURNING *",
	)
	.bind(Uuid::new_v4())
	.bind(user_id)
	.bind(Utc::now())
	.fetch_one(executor)
	.await
}

/// Sign up
/// Registers a new account, returning an associated session cookie.
#[route(
	tag = tag::AUTH,
	response(status = 200, description = "Signed up successfully.", shape = "Json<model::Session>"),
	response(status = 409, description = "The username or email is already taken.")
)]
pub async fn signup(
	State(state): State<AppState>,
	Json(input): Json<model::SignupInput>,
) -> Result<impl IntoApiResponse, Error> {
	let user_id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &input.password, &user_id).map_err(AuthError::Argon)?;

	let mut tx = state.database.begin().await?;

	sqlx::query(
		"INSERT INTO users (id, email, username, password, created_at) VALUES (?, ?, ?, ?, ?)",
	)
	.bind(user_id)
	.bind(&input.email)
	.bind(&input.username)
	.bind(&hashed[..])
	.bind(Utc::now())
	.execute(&mut *tx)
	.await
	.map_err(signup_conflict)?;

	let session = start_session(&mut *tx, user_id).await?;

	tx.commit().await?;

	tracing::info!(username = %input.username, "user signed up");

	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Login page
/// Returns the context of the login page, including where to go afterwards.
#[route(tag = tag::AUTH)]
pub async fn login_page(Query(query): Query<model::NextQuery>) -> Json<model::LoginPage> {
	Json(model::LoginPage {
		next: session::safe_next(query.next.as_deref()).to_owned(),
	})
}

/// Log in
/// Logs in to an account, sets a session cookie and redirects to `next`.
#[route(
	tag = tag::AUTH,
	redirect(description = "Logged in, continue to `next`."),
	response(status = 401, description = "Invalid username or password.")
)]
pub async fn login(
	State(state): State<AppState>,
	Query(query): Query<model::NextQuery>,
	Json(input): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, Error> {
	let user = sqlx::query_as::<_, model::User>("SELECT * FROM users WHERE username = ?")
		.bind(&input.username)
		.fetch_optional(&state.database)
		.await?;

	let Some(user) = user else {
		return Err(AuthError::InvalidUsernameOrPassword.into());
	};

	let hashed = hash_password(&state.hasher, &input.password, &user.id).map_err(AuthError::Argon)?;

	if !password_matches(&user.password, &hashed) {
		return Err(AuthError::InvalidUsernameOrPassword.into());
	}

	let session = start_session(&state.database, user.id).await?;
	let cookie = session::create_cookie(session.id);

	Ok((
		[(header::SET_COOKIE, cookie.to_string())],
		Redirect::to(session::safe_next(query.next.as_deref())),
	))
}

/// Log out
/// Ends the current session, if any, and clears the session cookie.
#[route(tag = tag::AUTH, response(status = 204, description = "Logged out successfully."))]
pub async fn logout(
	State(database): State<Database>,
	viewer: Viewer,
) -> Result<impl IntoApiResponse, Error> {
	if let Viewer(Some(session)) = viewer {
		sqlx::query("DELETE FROM sessions WHERE id = ?")
			.bind(session.id)
			.execute(&database)
			.await?;
	}

	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	))
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}

/// Delete user
/// Deletes the authenticated user along with their posts, comments and subscriptions. This action is irreversible.
#[route(tag = tag::AUTH, response(status = 204, description = "Account deleted."))]
pub async fn delete_me(
	State(database): State<Database>,
	session: Session,
) -> Result<impl IntoApiResponse, Error> {
	sqlx::query("DELETE FROM users WHERE id = ?")
		.bind(session.user.id)
		.execute(&database)
		.await?;

	tracing::info!(username = %session.user.username, "user deleted their account");

	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	))
}
