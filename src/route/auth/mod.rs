use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid username or password")]
	InvalidUsernameOrPassword,
	#[error("password validation error")]
	Argon(#[from] argon2::Error),
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/signup/", post_with(signup, signup_docs))
		.api_route(
			"/login/",
			get_with(login_page, login_page_docs).post_with(login, login_docs),
		)
		.api_route("/logout/", get_with(logout, logout_docs))
		.api_route(
			"/me/",
			get_with(get_me, get_me_docs).delete_with(delete_me, delete_me_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidUsernameOrPassword => StatusCode::UNAUTHORIZED,
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_signup_flow(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/auth/signup/")
			.json(&json!({
				"email": "john@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let cookie = session_cookie(&response);

		let response = app
			.post("/auth/login/")
			.add_query_param("next", "/follow/")
			.json(&json!({
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header("location"), "/follow/");
		assert_ne!(session_cookie(&response), cookie);

		let response = app
			.get("/auth/me/")
			.add_header(header::COOKIE, cookie)
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["username"], "john");
	}

	#[sqlx::test]
	async fn test_signup_duplicate_username(pool: Database) {
		let app = app(pool.clone());
		create_user(&pool, "john").await;

		let response = app
			.post("/auth/signup/")
			.json(&json!({
				"email": "other@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::CONFLICT);
	}

	#[sqlx::test]
	async fn test_signup_invalid_input(pool: Database) {
		let app = app(pool);

		let response = app
			.post("/auth/signup/")
			.json(&json!({
				"email": "not an email",
				"username": "john smith",
				"password": "short",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(response.json::<Value>()["errors"].as_array().unwrap().len(), 3);
	}

	#[sqlx::test]
	async fn test_login_wrong_password(pool: Database) {
		let app = app(pool);

		app.post("/auth/signup/")
			.json(&json!({
				"email": "john@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		let response = app
			.post("/auth/login/")
			.json(&json!({
				"username": "john",
				"password": "hunter3hunter",
			}))
			.await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
	}

	#[sqlx::test]
	async fn test_login_ignores_foreign_next(pool: Database) {
		let app = app(pool);

		let response = app
			.get("/auth/login/")
			.add_query_param("next", "//evil.example/")
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["next"], "/");
	}

	#[sqlx::test]
	async fn test_logout_ends_session(pool: Database) {
		let app = app(pool.clone());
		let user = create_user(&pool, "john").await;

		let response = app
			.get("/auth/logout/")
			.add_header(header::COOKIE, user.cookie())
			.await;

		assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

		let response = app
			.get("/auth/me/")
			.add_header(header::COOKIE, user.cookie())
			.await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
	}

	#[sqlx::test]
	async fn test_delete_account_removes_content(pool: Database) {
		let app = app(pool.clone());
		let user = create_user(&pool, "john").await;
		let other = create_user(&pool, "other").await;
		let post = create_post(&pool, &user, "Тест текст поста", None).await;
		let other_post = create_post(&pool, &other, "other post", None).await;
		create_comment(&pool, &user, other_post, "john's comment").await;
		create_comment(&pool, &other, other_post, "other's comment").await;
		create_follow(&pool, &user, &other).await;
		create_follow(&pool, &other, &user).await;

		let response = app
			.delete("/auth/me/")
			.add_header(header::COOKIE, user.cookie())
			.await;

		assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

		let response = app.get(&format!("/posts/{post}/")).await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(count_rows(&pool, "posts").await, 1);
		assert_eq!(count_rows(&pool, "comments").await, 1);
		assert_eq!(count_rows(&pool, "follows").await, 0);
		assert_eq!(count_rows(&pool, "sessions").await, 1);

		let body = app.get(&format!("/posts/{other_post}/")).await.json::<Value>();

		assert_eq!(body["comments"][0]["text"], "other's comment");
	}
}
