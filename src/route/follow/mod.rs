use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};

use crate::AppState;

pub mod route;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/follow/", get_with(follow_index, follow_index_docs))
		.api_route(
			"/profile/:username/follow/",
			post_with(profile_follow, profile_follow_docs),
		)
		.api_route(
			"/profile/:username/unfollow/",
			post_with(profile_unfollow, profile_unfollow_docs),
		)
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_follow_is_idempotent(pool: Database) {
		let app = app(pool.clone());
		let author = create_user(&pool, "author").await;
		let reader = create_user(&pool, "reader").await;

		for _ in 0..2 {
			let response = app
				.post("/profile/author/follow/")
				.add_header(header::COOKIE, reader.cookie())
				.await;

			assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
			assert_eq!(response.header("location"), "/profile/author/");
		}

		assert_eq!(count_rows(&pool, "follows").await, 1);

		let body = app
			.get("/profile/author/")
			.add_header(header::COOKIE, reader.cookie())
			.await
			.json::<Value>();

		assert_eq!(body["following"], true);

		let body = app
			.get("/profile/reader/")
			.add_header(header::COOKIE, author.cookie())
			.await
			.json::<Value>();

		assert_eq!(body["following"], false);
	}

	#[sqlx::test]
	async fn test_self_follow_is_ignored(pool: Database) {
		let app = app(pool.clone());
		let user = create_user(&pool, "john").await;

		let response = app
			.post("/profile/john/follow/")
			.add_header(header::COOKIE, user.cookie())
			.await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header("location"), "/profile/john/");
		assert_eq!(count_rows(&pool, "follows").await, 0);
	}

	#[sqlx::test]
	async fn test_unfollow(pool: Database) {
		let app = app(pool.clone());
		create_user(&pool, "author").await;
		let reader = create_user(&pool, "reader").await;

		let response = app
			.post("/profile/author/unfollow/")
			.add_header(header::COOKIE, reader.cookie())
			.await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(count_rows(&pool, "follows").await, 0);

		app.post("/profile/author/follow/")
			.add_header(header::COOKIE, reader.cookie())
			.await;

		assert_eq!(count_rows(&pool, "follows").await, 1);

		let response = app
			.post("/profile/author/unfollow/")
			.add_header(header::COOKIE, reader.cookie())
			.await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(response.header("location"), "/profile/author/");
		assert_eq!(count_rows(&pool, "follows").await, 0);
	}

	#[sqlx::test]
	async fn test_follow_feed(pool: Database) {
		let app = app(pool.clone());
		let author = create_user(&pool, "author").await;
		let reader = create_user(&pool, "reader").await;
		let stranger = create_user(&pool, "stranger").await;

		app.post("/profile/author/follow/")
			.add_header(header::COOKIE, reader.cookie())
			.await;

		create_post(&pool, &author, "Тест текст поста", None).await;

		let body = app
			.get("/follow/")
			.add_header(header::COOKIE, reader.cookie())
			.await
			.json::<Value>();

		assert_eq!(body["page"]["count"], 1);
		assert_eq!(body["page"]["items"][0]["text"], "Тест текст поста");

		let body = app
			.get("/follow/")
			.add_header(header::COOKIE, stranger.cookie())
			.await
			.json::<Value>();

		assert_eq!(body["page"]["count"], 0);
		assert_eq!(body["page"]["items"].as_array().unwrap().len(), 0);
	}

	#[sqlx::test]
	async fn test_follow_requires_login(pool: Database) {
		let app = app(pool.clone());
		create_user(&pool, "author").await;

		let response = app.get("/follow/").add_query_param("page", "2").await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(login_next(&response), "/follow/?page=2");

		let response = app.post("/profile/author/follow/").await;

		assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
		assert_eq!(login_next(&response), "/profile/author/follow/");
		assert_eq!(count_rows(&pool, "follows").await, 0);
	}

	#[sqlx::test]
	async fn test_follow_unknown_author(pool: Database) {
		let app = app(pool.clone());
		let user = create_user(&pool, "john").await;

		for path in ["/profile/missing/follow/", "/profile/missing/unfollow/"] {
			let response = app
				.post(path)
				.add_header(header::COOKIE, user.cookie())
				.await;

			assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "{path}");
		}
	}
}
