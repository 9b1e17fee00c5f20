use url::form_urlencoded;
use uuid::Uuid;

pub const COOKIE_NAME: &str = "session";

/// Where anonymous visitors of a protected route are sent.
pub const LOGIN_URL: &str = "/auth/login/";

/// Creates a session cookie with no expiry
pub fn create_cookie(session_id: Uuid) -> cookie::Cookie<'static> {
	cookie::Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(!cfg!(debug_assertions))
		.http_only(true)
		.same_site(cookie::SameSite::Lax)
		.path("/")
		.into()
}

/// Creates an empty session cookie used to invalidate a previous one
pub fn clear_cookie() -> cookie::Cookie<'static> {
	cookie::Cookie::build(COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}

/// The login page, carrying the path to return to once logged in.
pub fn login_url(next: &str) -> String {
	let query = form_urlencoded::Serializer::new(String::new())
		.append_pair("next", next)
		.finish();

	format!("{LOGIN_URL}?{query}")
}

/// Returns `next` if it points back into this site, otherwise the index.
pub fn safe_next(next: Option<&str>) -> &str {
	match next {
		Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => next,
		_ => "/",
	}
}
