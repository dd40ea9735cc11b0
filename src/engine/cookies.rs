//! Cookies: the [`Cookie`] model, the host [`CookieProvider`] capability and an
//! in-memory provider.

mod cookie_jar;
mod cookies;
mod provider;

pub use cookies::Cookie;
pub use cookies::CookieDescriptor;

pub use provider::CookieProvider;
pub use provider::CookieProviderHandle;

pub use cookie_jar::InMemoryCookieJar;
