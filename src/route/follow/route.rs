use axum::extract::State;
use macros::route;

use crate::{
	error::Error,
	extract::{Json, Path, Query, Session},
	model::{Author, Feed},
	openapi::tag,
	response::Redirect,
	route::posts::{self, model::IndexPage, model::PageQuery, profile_url},
	AppState, Database,
};

async fn find_author(database: &Database, username: String) -> Result<Author, Error> {
	Ok(Author::find(database, &username)
		.await?
		.ok_or(posts::Error::UnknownUser(username))?)
}

/// Follow feed
/// Returns a page of posts by every author the user follows, newest first.
#[route(tag = tag::FOLLOW)]
pub async fn follow_index(
	State(state): State<AppState>,
	session: Session,
	Query(query): Query<PageQuery>,
) -> Result<Json<IndexPage>, Error> {
	let page = Feed::FollowedBy(session.user.id)
		.page(&state.database, state.config.posts_per_page, query.requested())
		.await?;

	Ok(Json(IndexPage { page }))
}

/// Follow author
/// Subscribes to an author and redirects to their profile. Following yourself
/// or an author you already follow changes nothing.
#[route(tag = tag::FOLLOW, redirect(description = "Continue to the author's profile."))]
pub async fn profile_follow(
	State(database): State<Database>,
	session: Session,
	Path(username): Path<String>,
) -> Result<Redirect, Error> {
	let author = find_author(&database, username).await?;

	if author.id != session.user.id {
		let result = sqlx::query(
			r#"
				INSERT INTO follows (user_id, author_id) VALUES (?, ?)
				ON CONFLICT (user_id, author_id) DO NOTHING
			"#,
		)
		.bind(session.user.id)
		.bind(author.id)
		.execute(&database)
		.await?;

		if result.rows_affected() > 0 {
			tracing::info!(user = %session.user.username, author = %author.username, "followed author");
		}
	}

	Ok(Redirect::to(profile_url(&author.username)))
}

/// Unfollow author
/// Unsubscribes from an author and redirects to their profile.
#[route(tag = tag::FOLLOW, redirect(description = "Continue to the author's profile."))]
pub async fn profile_unfollow(
	State(database): State<Database>,
	session: Session,
	Path(username): Path<String>,
) -> Result<Redirect, Error> {
	let author = find_author(&database, username).await?;

	let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
		.bind(session.user.id)
		.bind(author.id)
		.execute(&database)
		.await?;

	if result.rows_affected() > 0 {
		tracing::info!(user = %session.user.username, author = %author.username, "unfollowed author");
	}

	Ok(Redirect::to(profile_url(&author.username)))
}
