pub use crate::route::model::{Page, PageQuery};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
	error::FieldErrors,
	model::{Author, Comment, Group, Post},
};

/// The longest image path a post may carry.
const IMAGE_MAX_LENGTH: usize = 100;
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

fn not_blank(text: &str) -> Result<(), ValidationError> {
	if text.trim().is_empty() {
		let mut error = ValidationError::new("blank");
		error.message = Some("this field is required".into());

		return Err(error);
	}

	Ok(())
}

/// Image paths are relative to the media directory and name an image file.
fn validate_image(image: &str) -> Result<(), ValidationError> {
	let file_name = image.rsplit(['/', '\\']).next().unwrap_or(image);

	let message = if image.chars().count() > IMAGE_MAX_LENGTH {
		"must be at most 100 characters long"
	} else if image.starts_with('/') || image.split(['/', '\\']).any(|part| part == "..") {
		"must be a relative path inside the media directory"
	} else if !file_name.rsplit_once('.').is_some_and(|(name, extension)| {
		!name.is_empty() && IMAGE_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
	}) {
		"must be a jpg, jpeg, png, gif or webp file"
	} else {
		return Ok(());
	};

	let mut error = ValidationError::new("image");
	error.message = Some(message.into());

	Err(error)
}

/// The input of the create and edit post forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
pub struct PostForm {
	/// The text of the post.
	#[serde(default)]
	#[validate(custom(function = "not_blank"))]
	pub text: String,
	/// The id of the group to publish the post in.
	#[serde(default)]
	pub group: Option<i64>,
	/// The path of an image to attach to the post.
	#[serde(default)]
	#[validate(custom(function = "validate_image"))]
	pub image: Option<String>,
}

impl PostForm {
	/// An empty image path is the same as no image.
	pub fn normalized(self) -> Self {
		Self {
			image: self.image.filter(|image| !image.trim().is_empty()),
			..self
		}
	}
}

impl From<&Post> for PostForm {
	fn from(post: &Post) -> Self {
		Self {
			text: post.text.clone(),
			group: post.group.as_ref().map(|group| group.id),
			image: post.image.clone(),
		}
	}
}

/// The input of the comment form shown below a post.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, JsonSchema)]
pub struct CommentForm {
	#[serde(default)]
	#[validate(custom(function = "not_blank"))]
	pub text: String,
}

/// The context of the index page.
#[derive(Debug, Serialize, JsonSchema)]
pub struct IndexPage {
	pub page: Page<Post>,
}

/// The context of a group's page.
#[derive(Debug, Serialize, JsonSchema)]
pub struct GroupPage {
	pub group: Group,
	pub page: Page<Post>,
}

/// The context of an author's profile page.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ProfilePage {
	pub author: Author,
	/// The total number of posts written by the author.
	pub count: i64,
	/// Whether the requesting user follows the author. Absent for anonymous requests.
	pub following: Option<bool>,
	pub page: Page<Post>,
}

/// The context of a single post's page.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostDetailPage {
	pub post: Post,
	/// The first 30 characters of the post.
	pub title: String,
	pub author: Author,
	/// The total number of posts written by the author.
	pub author_posts: i64,
	/// The comments of the post, oldest first.
	pub comments: Vec<Comment>,
	pub form: CommentForm,
}

/// The context of the create and edit post pages.
#[derive(Debug, Serialize, JsonSchema)]
pub struct PostFormPage {
	/// The submitted (or current) values of the form.
	pub form: PostForm,
	/// Messages for every field that failed validation.
	pub errors: FieldErrors,
	pub is_edit: bool,
	/// The post being edited.
	pub post: Option<Post>,
	/// The groups a post can be published in.
	pub groups: Vec<Group>,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_blank_text_is_rejected() {
		let form = PostForm {
			text: " \n\t".into(),
			..Default::default()
		};

		let errors = form.validate().unwrap_err();

		assert!(errors.field_errors().contains_key("text"));
		assert!(CommentForm::default().validate().is_err());
	}

	#[test]
	fn test_image_paths() {
		assert!(validate_image("posts/cat.jpg").is_ok());
		assert!(validate_image("posts/CAT.PNG").is_ok());
		assert!(validate_image("/etc/cat.jpg").is_err());
		assert!(validate_image("posts/../../cat.jpg").is_err());
		assert!(validate_image("posts/cat.exe").is_err());
		assert!(validate_image("posts/.jpg").is_err());
		assert!(validate_image(&format!("{}.jpg", "a".repeat(100))).is_err());
	}

	#[test]
	fn test_empty_image_is_none() {
		let form = PostForm {
			text: "text".into(),
			group: None,
			image: Some("  ".into()),
		}
		.normalized();

		assert_eq!(form.image, None);
		assert!(form.validate().is_ok());
	}
}
