//! Cookie jar extraction and `Set-Cookie` emission.
//!
//! Handlers take [`Cookies`] as an extractor, mutate the jar, and return it
//! as a response part. Only cookies changed during the request are written
//! back.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, IntoResponseParts, Response, ResponseParts},
};
use cookie::{Cookie, CookieJar};
use std::convert::Infallible;

#[derive(Debug, Clone, Default)]
pub struct Cookies(pub CookieJar);

/// Jar seeded with every cookie from the request's `Cookie` headers.
/// Unparseable pairs are skipped.
pub fn jar_from_headers(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for cookie in Cookie::split_parse(value).filter_map(Result::ok) {
            jar.add_original(cookie.into_owned());
        }
    }
    jar
}

impl<S> FromRequestParts<S> for Cookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Cookies(jar_from_headers(&parts.headers)))
    }
}

impl IntoResponseParts for Cookies {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for cookie in self.0.delta() {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    res.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(_) => tracing::warn!(name = cookie.name(), "Dropping cookie with invalid header value"),
            }
        }
        Ok(res)
    }
}

impl IntoResponse for Cookies {
    fn into_response(self) -> Response {
        (self, ()).into_response()
    }
}
