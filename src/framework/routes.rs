// Paths of the blog routes, used for redirects

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped in the `next` parameter; path separators stay readable
const NEXT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn profile(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub fn post_detail(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

/// Login page URL carrying the originally requested path in `next`
pub fn login(login_url: &str, next: &str) -> String {
    format!("{}?next={}", login_url, utf8_percent_encode(next, NEXT_SET))
}
