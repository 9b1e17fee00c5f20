use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// The `?page=` query parameter of a feed.
///
/// Kept as a raw string so that garbage falls back to the first page
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct PageQuery {
	/// The page number to return (1-indexed).
	pub page: Option<String>,
}

impl PageQuery {
	pub fn requested(&self) -> Option<&str> {
		self.page.as_deref()
	}
}

/// The position of a single page within a paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Window {
	/// The current page number (1-indexed).
	pub number: i64,
	/// The total number of pages. An empty collection still has one page.
	pub num_pages: i64,
	/// The total number of items across all pages.
	pub count: i64,
	pub has_previous: bool,
	pub has_next: bool,
	#[serde(skip)]
	per_page: i64,
}

impl Window {
	/// Resolves the requested page against a collection of `count` items.
	///
	/// Missing or malformed page numbers resolve to the first page, and
	/// out-of-range numbers are clamped to the nearest existing page.
	pub fn new(count: i64, per_page: u32, requested: Option<&str>) -> Self {
		let per_page = i64::from(per_page.max(1));
		let count = count.max(0);
		let num_pages = ((count + per_page - 1) / per_page).max(1);

		let number = requested
			.and_then(parse_page)
			.unwrap_or(1)
			.clamp(1, num_pages);

		Self {
			number,
			num_pages,
			count,
			has_previous: number > 1,
			has_next: number < num_pages,
			per_page,
		}
	}

	pub fn offset(&self) -> i64 {
		(self.number - 1) * self.per_page
	}

	pub fn limit(&self) -> i64 {
		self.per_page
	}
}

/// Parses a page number. Integers too large for `i64` saturate so that
/// they still clamp to the first or last page.
fn parse_page(page: &str) -> Option<i64> {
	let page = page.trim();

	page.parse::<i64>().ok().or_else(|| {
		let (saturated, digits) = match page.strip_prefix('-') {
			Some(digits) => (i64::MIN, digits),
			None => (i64::MAX, page.strip_prefix('+').unwrap_or(page)),
		};

		(!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(saturated)
	})
}

/// A single page of items along with its position in the collection.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Page<T> {
	pub items: Vec<T>,
	#[serde(flatten)]
	pub window: Window,
}

impl<T> Page<T> {
	pub fn new(items: Vec<T>, window: Window) -> Self {
		Self { items, window }
	}
}

#[cfg(test)]
mod test {
	use super::Window;

	#[test]
	fn test_window_offset() {
		let window = Window::new(13, 10, None);

		assert_eq!(window.number, 1);
		assert_eq!(window.offset(), 0);
		assert_eq!(window.limit(), 10);

		let window = Window::new(13, 10, Some("2"));

		assert_eq!(window.number, 2);
		assert_eq!(window.offset(), 10);

		let window = Window::new(13, 5, Some("3"));

		assert_eq!(window.offset(), 10);
	}

	#[test]
	fn test_window_pages() {
		let window = Window::new(13, 10, Some("1"));

		assert_eq!(window.num_pages, 2);
		assert_eq!(window.count, 13);
		assert!(!window.has_previous);
		assert!(window.has_next);

		let window = Window::new(20, 10, Some("2"));

		assert_eq!(window.num_pages, 2);
		assert!(window.has_previous);
		assert!(!window.has_next);
	}

	#[test]
	fn test_window_clamps_out_of_range() {
		assert_eq!(Window::new(13, 10, Some("3")).number, 2);
		assert_eq!(Window::new(13, 10, Some("999")).number, 2);
		assert_eq!(Window::new(13, 10, Some("0")).number, 1);
		assert_eq!(Window::new(13, 10, Some("-4")).number, 1);
		assert_eq!(Window::new(13, 10, Some("99999999999999999999")).number, 2);
		assert_eq!(Window::new(13, 10, Some("+99999999999999999999")).number, 2);
		assert_eq!(Window::new(13, 10, Some("-99999999999999999999")).number, 1);
	}

	#[test]
	fn test_window_invalid_page() {
		assert_eq!(Window::new(13, 10, Some("last")).number, 1);
		assert_eq!(Window::new(13, 10, Some("")).number, 1);
		assert_eq!(Window::new(13, 10, Some("+")).number, 1);
		assert_eq!(Window::new(13, 10, Some("99999999999999999999x")).number, 1);
		assert_eq!(Window::new(13, 10, Some(" 2 ")).number, 2);
	}

	#[test]
	fn test_window_empty_collection() {
		let window = Window::new(0, 10, Some("5"));

		assert_eq!(window.number, 1);
		assert_eq!(window.num_pages, 1);
		assert_eq!(window.offset(), 0);
		assert!(!window.has_next);
	}
}
