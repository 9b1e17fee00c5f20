use axum::extract::State;
use chrono::Utc;
use macros::route;
use validator::Validate;

use crate::{
	error::{field_errors, Error, FieldErrors},
	extract::{Form, Json, Path, Query, Session, Viewer},
	model::{Author, Comment, Feed, Group, Post},
	openapi::tag,
	response::{FormResponse, Redirect},
	AppState, Database,
};

use super::{model, post_url, profile_url, Error as PostError};

/// Validates a submitted post, including that the chosen group exists.
async fn check(database: &Database, form: &model::PostForm) -> Result<FieldErrors, Error> {
	let mut errors = form
		.validate()
		.map_or_else(|errors| field_errors(&errors), |()| FieldErrors::new());

	if let Some(group) = form.group {
		if !Group::exists(database, group).await? {
			errors
				.entry("group".into())
				.or_default()
				.push("select a valid group".into());
		}
	}

	Ok(errors)
}

async fn find_post(database: &Database, post_id: i64) -> Result<Post, Error> {
	Ok(Post::find(database, post_id)
		.await?
		.ok_or(PostError::UnknownPost(post_id))?)
}

/// Index
/// Returns a page of every post, newest first.
#[route(tag = tag::POST)]
pub async fn index(
	State(state): State<AppState>,
	Query(query): Query<model::PageQuery>,
) -> Result<Json<model::IndexPage>, Error> {
	let page = Feed::All
		.page(&state.database, state.config.posts_per_page, query.requested())
		.await?;

	Ok(Json(model::IndexPage { page }))
}

/// Group posts
/// Returns a group along with a page of its posts, newest first.
#[route(tag = tag::POST)]
pub async fn group_posts(
	State(state): State<AppState>,
	Path(slug): Path<String>,
	Query(query): Query<model::PageQuery>,
) -> Result<Json<model::GroupPage>, Error> {
	let group = Group::find(&state.database, &slug)
		.await?
		.ok_or(PostError::UnknownGroup(slug))?;

	let page = Feed::Group(group.id)
		.page(&state.database, state.config.posts_per_page, query.requested())
		.await?;

	Ok(Json(model::GroupPage { group, page }))
}

/// Profile
/// Returns an author along with a page of their posts, newest first. Authenticated
/// requests also learn whether they follow the author.
#[route(tag = tag::POST)]
pub async fn profile(
	State(state): State<AppState>,
	viewer: Viewer,
	Path(username): Path<String>,
	Query(query): Query<model::PageQuery>,
) -> Result<Json<model::ProfilePage>, Error> {
	let author = Author::find(&state.database, &username)
		.await?
		.ok_or(PostError::UnknownUser(username))?;

	let feed = Feed::Author(author.id);
	let count = feed.count(&state.database).await?;
	let page = feed
		.page(&state.database, state.config.posts_per_page, query.requested())
		.await?;

	let following = match viewer.user() {
		Some(user) => Some(author.is_followed_by(&state.database, user.id).await?),
		None => None,
	};

	Ok(Json(model::ProfilePage {
		author,
		count,
		following,
		page,
	}))
}

/// Post detail
/// Returns a single post with its comments and an empty comment form.
#[route(tag = tag::POST)]
pub async fn post_detail(
	State(database): State<Database>,
	Path(post_id): Path<i64>,
) -> Result<Json<model::PostDetailPage>, Error> {
	let post = find_post(&database, post_id).await?;
	let author_posts = Feed::Author(post.author.id).count(&database).await?;
	let comments = Comment::for_post(&database, post.id).await?;

	Ok(Json(model::PostDetailPage {
		title: post.title(),
		author: post.author.clone(),
		author_posts,
		comments,
		form: model::CommentForm::default(),
		post,
	}))
}

/// New post form
/// Returns an empty post form along with the groups a post can be published in.
#[route(tag = tag::POST)]
pub async fn create_post_form(
	State(database): State<Database>,
	_session: Session,
) -> Result<Json<model::PostFormPage>, Error> {
	Ok(Json(model::PostFormPage {
		form: model::PostForm::default(),
		errors: FieldErrors::new(),
		is_edit: false,
		post: None,
		groups: Group::all(&database).await?,
	}))
}

/// Create post
/// Publishes a new post and redirects to the author's profile. Invalid input
/// re-displays the form with its errors.
#[route(
	tag = tag::POST,
	redirect(description = "Created, continue to the author's profile."),
	response(status = 400, description = "Invalid input.", shape = "Json<model::PostFormPage>")
)]
pub async fn create_post(
	State(database): State<Database>,
	session: Session,
	Form(form): Form<model::PostForm>,
) -> Result<FormResponse<model::PostFormPage>, Error> {
	let form = form.normalized();
	let errors = check(&database, &form).await?;

	if !errors.is_empty() {
		return Ok(FormResponse::Invalid(model::PostFormPage {
			form,
			errors,
			is_edit: false,
			post: None,
			groups: Group::all(&database).await?,
		}));
	}

	let post_id = sqlx::query_scalar::<_, i64>(
		r#"
			INSERT INTO posts (text, pub_date, author_id, group_id, image)
			VALUES (?, ?, ?, ?, ?)
			RETURNING id
		"#,
	)
	.bind(form.text.trim())
	.bind(Utc::now())
	.bind(session.user.id)
	.bind(form.group)
	.bind(&form.image)
	.fetch_one(&database)
	.await?;

	tracing::info!(post_id, author = %session.user.username, "post created");

	Ok(Redirect::to(profile_url(&session.user.username)).into())
}

/// Edit post form
/// Returns the form pre-filled with the post's current values. Users other
/// than the author are redirected to the post.
#[route(tag = tag::POST, redirect(description = "Not the author, continue to the post."))]
pub async fn edit_post_form(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<i64>,
) -> Result<FormResponse<model::PostFormPage>, Error> {
	let post = find_post(&database, post_id).await?;

	if post.author.id != session.user.id {
		return Ok(Redirect::to(post_url(post.id)).into());
	}

	Ok(FormResponse::Show(model::PostFormPage {
		form: model::PostForm::from(&post),
		errors: FieldErrors::new(),
		is_edit: true,
		post: Some(post),
		groups: Group::all(&database).await?,
	}))
}

/// Edit post
/// Replaces the text, group and image of a post and redirects to it. The author
/// and publication date never change.
#[route(
	tag = tag::POST,
	redirect(description = "Saved, or not the author. Continue to the post."),
	response(status = 400, description = "Invalid input.", shape = "Json<model::PostFormPage>")
)]
pub async fn edit_post(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<i64>,
	Form(form): Form<model::PostForm>,
) -> Result<FormResponse<model::PostFormPage>, Error> {
	let post = find_post(&database, post_id).await?;

	if post.author.id != session.user.id {
		tracing::debug!(post_id, user = %session.user.username, "edit by non-author ignored");

		return Ok(Redirect::to(post_url(post.id)).into());
	}

	let form = form.normalized();
	let errors = check(&database, &form).await?;

	if !errors.is_empty() {
		return Ok(FormResponse::Invalid(model::PostFormPage {
			form,
			errors,
			is_edit: true,
			post: Some(post),
			groups: Group::all(&database).await?,
		}));
	}

	sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ? AND author_id = ?")
		.bind(form.text.trim())
		.bind(form.group)
		.bind(&form.image)
		.bind(post.id)
		.bind(session.user.id)
		.execute(&database)
		.await?;

	tracing::info!(post_id, previous = %post.excerpt(), "post edited");

	Ok(Redirect::to(post_url(post.id)).into())
}

/// Add comment
/// Adds a comment to a post and redirects back to it. Blank comments are dropped.
#[route(tag = tag::POST, redirect(description = "Continue to the post."))]
pub async fn add_comment(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<i64>,
	Form(form): Form<model::CommentForm>,
) -> Result<Redirect, Error> {
	let post = find_post(&database, post_id).await?;

	if form.validate().is_ok() {
		sqlx::query("INSERT INTO comments (post_id, author_id, text, created) VALUES (?, ?, ?, ?)")
			.bind(post.id)
			.bind(session.user.id)
			.bind(form.text.trim())
			.bind(Utc::now())
			.execute(&database)
			.await?;

		tracing::debug!(post_id, author = %session.user.username, "comment added");
	}

	Ok(Redirect::to(post_url(post.id)))
}
