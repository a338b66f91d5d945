use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

/// Returns the visitor's session id, issuing a fresh cookie when the request
/// carries none or carries one that is not a session id we could have set.
pub fn visitor_session(jar: CookieJar, cookie_name: &str) -> (CookieJar, String) {
    if let Some(id) = jar
        .get(cookie_name)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        return (jar, id.to_string());
    }

    let id = Uuid::new_v4().to_string();
    let cookie = Cookie::build((cookie_name.to_owned(), id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), id)
}
