use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;

use crate::{
	route::model::{Page, Window},
	Database,
};

/// Posts joined with their author and (optional) group, ready to be
/// filtered and ordered.
const SELECT_POSTS: &str = r#"
	SELECT
		posts.id, posts.text, posts.pub_date, posts.image,
		posts.author_id, users.username AS author_username,
		posts.group_id, post_groups.slug AS group_slug, post_groups.title AS group_title
	FROM posts
	JOIN users ON users.id = posts.author_id
	LEFT JOIN post_groups ON post_groups.id = posts.group_id
"#;

/// Newest first. Posts created within the same instant fall back to insertion order.
const NEWEST_FIRST: &str = "ORDER BY posts.pub_date DESC, posts.id DESC";

/// The public identity of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Author {
	pub id: Uuid,
	pub username: String,
}

/// A named community that posts can be published in.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Group {
	pub id: i64,
	pub title: String,
	/// The unique, URL-safe name of the group.
	pub slug: String,
	pub description: String,
}

/// The part of a group shown next to each of its posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct GroupRef {
	pub id: i64,
	pub slug: String,
	pub title: String,
}

/// A single post, created by a user.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Post {
	pub id: i64,
	pub text: String,
	/// The creation time of the post. Never changes after creation.
	pub pub_date: DateTime<Utc>,
	pub author: Author,
	pub group: Option<GroupRef>,
	/// The path of the image attached to the post.
	pub image: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PostRow {
	id: i64,
	text: String,
	pub_date: DateTime<Utc>,
	image: Option<String>,
	author_id: Uuid,
	author_username: String,
	group_id: Option<i64>,
	group_slug: Option<String>,
	group_title: Option<String>,
}

impl From<PostRow> for Post {
	fn from(row: PostRow) -> Self {
		let group = match (row.group_id, row.group_slug, row.group_title) {
			(Some(id), Some(slug), Some(title)) => Some(GroupRef { id, slug, title }),
			_ => None,
		};

		Self {
			id: row.id,
			text: row.text,
			pub_date: row.pub_date,
			author: Author {
				id: row.author_id,
				username: row.author_username,
			},
			group,
			image: row.image,
		}
	}
}

impl Post {
	/// The short representation of a post used in listings.
	pub fn excerpt(&self) -> String {
		truncate(&self.text, 15)
	}

	/// The title of the post's own page.
	pub fn title(&self) -> String {
		truncate(&self.text, 30)
	}

	pub async fn find(database: &Database, id: i64) -> Result<Option<Self>, sqlx::Error> {
		let sql = format!("{SELECT_POSTS} WHERE posts.id = ?");
		let row = sqlx::query_as::<_, PostRow>(&sql)
			.bind(id)
			.fetch_optional(database)
			.await?;

		Ok(row.map(Into::into))
	}
}

fn truncate(text: &str, chars: usize) -> String {
	text.chars().take(chars).collect()
}

/// A reply to a post.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Comment {
	pub id: i64,
	pub post_id: i64,
	pub author: Author,
	pub text: String,
	/// The creation time of the comment.
	pub created: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
	id: i64,
	post_id: i64,
	author_id: Uuid,
	author_username: String,
	text: String,
	created: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
	fn from(row: CommentRow) -> Self {
		Self {
			id: row.id,
			post_id: row.post_id,
			author: Author {
				id: row.author_id,
				username: row.author_username,
			},
			text: row.text,
			created: row.created,
		}
	}
}

impl Comment {
	/// Returns the comments of a post, oldest first.
	pub async fn for_post(database: &Database, post_id: i64) -> Result<Vec<Self>, sqlx::Error> {
		let rows = sqlx::query_as::<_, CommentRow>(
			r#"
				SELECT
					comments.id, comments.post_id, comments.text, comments.created,
					comments.author_id, users.username AS author_username
				FROM comments
				JOIN users ON users.id = comments.author_id
				WHERE comments.post_id = ?
				ORDER BY comments.created, comments.id
			"#,
		)
		.bind(post_id)
		.fetch_all(database)
		.await?;

		Ok(rows.into_iter().map(Into::into).collect())
	}
}

impl Author {
	pub async fn find(database: &Database, username: &str) -> Result<Option<Self>, sqlx::Error> {
		sqlx::query_as::<_, Self>("SELECT id, username FROM users WHERE username = ?")
			.bind(username)
			.fetch_optional(database)
			.await
	}

	/// Whether `follower` is subscribed to this author.
	pub async fn is_followed_by(&self, database: &Database, follower: Uuid) -> Result<bool, sqlx::Error> {
		let follows = sqlx::query_scalar::<_, i64>(
			"SELECT COUNT(*) FROM follows WHERE user_id = ? AND author_id = ?",
		)
		.bind(follower)
		.bind(self.id)
		.fetch_one(database)
		.await?;

		Ok(follows > 0)
	}
}

impl Group {
	pub async fn find(database: &Database, slug: &str) -> Result<Option<Self>, sqlx::Error> {
		sqlx::query_as::<_, Self>("SELECT * FROM post_groups WHERE slug = ?")
			.bind(slug)
			.fetch_optional(database)
			.await
	}

	pub async fn exists(database: &Database, id: i64) -> Result<bool, sqlx::Error> {
		let groups = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_groups WHERE id = ?")
			.bind(id)
			.fetch_one(database)
			.await?;

		Ok(groups > 0)
	}

	/// Every group, in the order they are offered when choosing one for a post.
	pub async fn all(database: &Database) -> Result<Vec<Self>, sqlx::Error> {
		sqlx::query_as::<_, Self>("SELECT * FROM post_groups ORDER BY title, id")
			.fetch_all(database)
			.await
	}
}

/// A selection of posts shown as a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
	/// Every post.
	All,
	/// The posts of a single group.
	Group(i64),
	/// The posts written by a single author.
	Author(Uuid),
	/// The posts of every author the user follows.
	FollowedBy(Uuid),
}

impl Feed {
	fn condition(self) -> &'static str {
		match self {
			Self::All => "",
			Self::Group(..) => "WHERE posts.group_id = ?",
			Self::Author(..) => "WHERE posts.author_id = ?",
			Self::FollowedBy(..) => {
				"WHERE posts.author_id IN (SELECT author_id FROM follows WHERE user_id = ?)"
			}
		}
	}

	/// The total number of posts in the feed.
	pub async fn count(self, database: &Database) -> Result<i64, sqlx::Error> {
		let sql = format!("SELECT COUNT(*) FROM posts {}", self.condition());
		let query = sqlx::query_scalar::<sqlx::Sqlite, i64>(&sql);

		match self {
			Self::All => query,
			Self::Group(id) => query.bind(id),
			Self::Author(id) | Self::FollowedBy(id) => query.bind(id),
		}
		.fetch_one(database)
		.await
	}

	/// Fetches one page of the feed, newest posts first.
	///
	/// `requested` is the raw page number from the query string; see [`Window::new`]
	/// for how it is resolved.
	pub async fn page(
		self,
		database: &Database,
		per_page: u32,
		requested: Option<&str>,
	) -> Result<Page<Post>, sqlx::Error> {
		let window = Window::new(self.count(database).await?, per_page, requested);

		let sql = format!(
			"{SELECT_POSTS} {} {NEWEST_FIRST} LIMIT ? OFFSET ?",
			self.condition()
		);
		let query = sqlx::query_as::<sqlx::Sqlite, PostRow>(&sql);
		let query = match self {
			Self::All => query,
			Self::Group(id) => query.bind(id),
			Self::Author(id) | Self::FollowedBy(id) => query.bind(id),
		};

		let rows = query
			.bind(window.limit())
			.bind(window.offset())
			.fetch_all(database)
			.await?;

		Ok(Page::new(rows.into_iter().map(Into::into).collect(), window))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn post(text: &str) -> Post {
		Post {
			id: 1,
			text: text.into(),
			pub_date: Utc::now(),
			author: Author {
				id: Uuid::new_v4(),
				username: "test-user".into(),
			},
			group: None,
			image: None,
		}
	}

	#[test]
	fn test_excerpt_and_title() {
		let post = post("Тест текст поста, который длиннее тридцати символов");

		assert_eq!(post.excerpt(), "Тест текст пост");
		assert_eq!(post.title(), "Тест текст поста, который длин");
		assert_eq!(post.excerpt().chars().count(), 15);
	}

	#[test]
	fn test_short_text_is_kept() {
		let post = post("short");

		assert_eq!(post.excerpt(), "short");
		assert_eq!(post.title(), "short");
	}

	#[test]
	fn test_row_without_group() {
		let post: Post = PostRow {
			id: 3,
			text: "text".into(),
			pub_date: Utc::now(),
			image: None,
			author_id: Uuid::new_v4(),
			author_username: "author".into(),
			group_id: None,
			group_slug: None,
			group_title: None,
		}
		.into();

		assert_eq!(post.group, None);
		assert_eq!(post.author.username, "author");
	}
}
