use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(i64),
	#[error("unknown group {0}")]
	UnknownGroup(String),
	#[error("unknown user {0}")]
	UnknownUser(String),
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(index, index_docs))
		.api_route("/group/:slug/", get_with(group_posts, group_posts_docs))
		.api_route("/profile/:username/", get_with(profile, profile_docs))
		.api_route("/posts/:post_id/", get_with(post_detail, post_detail_docs))
		.api_route(
			"/create/",
			get_with(create_post_form, create_post_form_docs).post_with(create_post, create_post_docs),
		)
		.api_route(
			"/posts/:post_id/edit/",
			get_with(edit_post_form, edit_post_form_docs).post_with(edit_post, edit_post_docs),
		)
		.api_route(
			"/posts/:post_id/comment/",
			post_with(add_comment, add_comment_docs),
		)
}

/// The page of an author.
pub fn profile_url(username: &str) -> String {
	format!("/profile/{username}/")
}

/// The page of a single post.
pub fn post_url(post_id: i64) -> String {
	format!("/posts/{post_id}/")
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownGroup(..) | Self::UnknownUser(..) => {
				StatusCode::NOT_FOUND
			}
		}
	}
}
