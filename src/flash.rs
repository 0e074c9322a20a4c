//! One-shot status messages carried across a redirect in a signed cookie.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tower_cookies::{
    cookie::{time::Duration, CookieJar, SameSite},
    Cookie, Cookies, Key,
};
use tracing::warn;
use utoipa::ToSchema;

use crate::errors::ServiceError;

pub const FLASH_COOKIE: &str = "__flash";

const FLASH_MAX_AGE_SECS: i64 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == FlashKind::Error
    }
}

/// Signing key for the `__flash` cookie, derived from the configured secret
#[derive(Clone)]
pub struct FlashSigner {
    key: Key,
}

impl std::fmt::Debug for FlashSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlashSigner").finish_non_exhaustive()
    }
}

fn flash_cookie(value: String) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(FLASH_MAX_AGE_SECS))
        .build()
}

fn payload(flash: &Flash) -> Result<String, ServiceError> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(flash)?))
}

fn parse_payload(value: &str) -> Option<Flash> {
    let json = URL_SAFE_NO_PAD.decode(value).ok()?;
    serde_json::from_slice(&json).ok()
}

impl FlashSigner {
    pub fn new(secret: &str) -> Result<Self, ServiceError> {
        if secret.is_empty() {
            return Err(ServiceError::InternalError(
                "flash secret must not be empty".into(),
            ));
        }
        // the signed jar wants 64 bytes of key material
        let master = Sha512::digest(secret.as_bytes());
        let key = Key::try_from(master.as_slice())
            .map_err(|e| ServiceError::InternalError(format!("invalid flash secret: {}", e)))?;
        Ok(Self { key })
    }

    /// The signed cookie value a browser would send back
    pub fn encode(&self, flash: &Flash) -> Result<String, ServiceError> {
        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key)
            .add(Cookie::new(FLASH_COOKIE, payload(flash)?));
        jar.get(FLASH_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| ServiceError::InternalError("flash cookie was not signed".into()))
    }

    /// Returns `None` for anything unsigned, tampered or malformed
    pub fn decode(&self, value: &str) -> Option<Flash> {
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(FLASH_COOKIE, value.to_string()));
        let verified = jar.signed(&self.key).get(FLASH_COOKIE);
        if verified.is_none() {
            warn!("rejected flash cookie with bad signature");
        }
        parse_payload(verified?.value())
    }

    /// Reads the value out of a `Set-Cookie` header produced by a redirect
    pub fn decode_set_cookie(&self, set_cookie: &str) -> Option<Flash> {
        let cookie = Cookie::parse(set_cookie).ok()?;
        if cookie.name() != FLASH_COOKIE || cookie.value().is_empty() {
            return None;
        }
        self.decode(cookie.value())
    }
}

/// Flash access for one request: the signing key plus the request's cookie jar.
///
/// Requires `CookieManagerLayer` on the router; the layer writes every change
/// made here back as `Set-Cookie`.
pub struct FlashCookies {
    signer: FlashSigner,
    cookies: Cookies,
}

#[async_trait]
impl<S> FromRequestParts<S> for FlashCookies
where
    S: Send + Sync,
    FlashSigner: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state).await?;
        Ok(Self {
            signer: FlashSigner::from_ref(state),
            cookies,
        })
    }
}

impl FlashCookies {
    /// Queues `flash` for the next page load without redirecting
    pub fn set(&self, flash: &Flash) {
        match payload(flash) {
            Ok(value) => self
                .cookies
                .signed(&self.signer.key)
                .add(flash_cookie(value)),
            Err(e) => warn!(error = %e, "could not encode flash message"),
        }
    }

    /// 303 redirect that carries `flash` to the next page load
    pub fn redirect(&self, location: impl Into<String>, flash: Flash) -> FlashRedirect {
        self.set(&flash);
        FlashRedirect {
            location: location.into(),
            flash,
        }
    }

    /// Consumes the pending flash. A present cookie is always cleared, even
    /// when its signature does not verify.
    pub fn take(&self) -> Option<Flash> {
        self.cookies.get(FLASH_COOKIE)?;
        let verified = self.cookies.signed(&self.signer.key).get(FLASH_COOKIE);
        self.cookies
            .remove(Cookie::build(FLASH_COOKIE).path("/").build());
        match verified {
            Some(cookie) => parse_payload(cookie.value()),
            None => {
                warn!("rejected flash cookie with bad signature");
                None
            }
        }
    }
}

/// See-other redirect; the flash itself travels in the cookie jar
#[derive(Debug, Clone)]
pub struct FlashRedirect {
    pub location: String,
    pub flash: Flash,
}

impl FlashRedirect {
    pub fn is_error(&self) -> bool {
        self.flash.is_error()
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        let location =
            HeaderValue::from_str(&self.location).unwrap_or_else(|_| HeaderValue::from_static("/"));
        (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;
    use tower_cookies::CookieManagerLayer;

    fn signer() -> FlashSigner {
        FlashSigner::new("flash-test-secret").unwrap()
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/go",
                get(|flash: FlashCookies| async move {
                    flash.redirect("/x/purchasing/orders", Flash::error("Failed to get purchase order"))
                }),
            )
            .route(
                "/stay",
                get(|flash: FlashCookies| async move {
                    flash.set(&Flash::error("Failed to update item group"));
                    axum::Json(serde_json::json!({}))
                }),
            )
            .route(
                "/page",
                get(|flash: FlashCookies| async move {
                    axum::Json(flash.take())
                }),
            )
            .layer(CookieManagerLayer::new())
            .with_state(signer())
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn signed_value_round_trips() {
        let s = signer();
        let value = s.encode(&Flash::success("Purchase order released")).unwrap();
        assert_eq!(s.decode(&value), Some(Flash::success("Purchase order released")));
    }

    #[test]
    fn forged_payload_is_rejected() {
        let s = signer();
        let value = s.encode(&Flash::error("Failed to upload file")).unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"kind":"success","message":"all good"}"#);
        // keep the signature prefix, swap the message
        let original = payload(&Flash::error("Failed to upload file")).unwrap();
        let signature = &value[..value.len() - original.len()];
        let forged = format!("{}{}", signature, forged_payload);
        assert_eq!(s.decode(&forged), None);
    }

    #[test]
    fn unsigned_and_foreign_values_are_rejected() {
        let unsigned = payload(&Flash::success("hi")).unwrap();
        assert_eq!(signer().decode(&unsigned), None);

        let value = signer().encode(&Flash::success("hi")).unwrap();
        let other = FlashSigner::new("another-secret").unwrap();
        assert_eq!(other.decode(&value), None);
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(FlashSigner::new("").is_err());
    }

    #[tokio::test]
    async fn redirect_sets_a_signed_cookie() {
        let response = app()
            .oneshot(Request::get("/go").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/x/purchasing/orders"
        );
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert_eq!(
            signer().decode_set_cookie(set_cookie),
            Some(Flash::error("Failed to get purchase order"))
        );
    }

    #[tokio::test]
    async fn page_load_consumes_and_clears_the_flash() {
        let value = signer().encode(&Flash::success("Updated supplier")).unwrap();
        let response = app()
            .oneshot(
                Request::get("/page")
                    .header(header::COOKIE, format!("theme=dark; {}={}", FLASH_COOKIE, value))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let cleared = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap();
        assert!(cleared.starts_with("__flash=;"));
        assert!(cleared.contains("Max-Age=0"));
        assert_eq!(body_json(response).await["message"], "Updated supplier");
    }

    #[tokio::test]
    async fn set_without_redirect_still_sends_the_cookie() {
        let response = app()
            .oneshot(Request::get("/stay").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::LOCATION).is_none());
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert_eq!(
            signer().decode_set_cookie(set_cookie),
            Some(Flash::error("Failed to update item group"))
        );
    }

    #[tokio::test]
    async fn no_cookie_means_no_flash_and_no_header() {
        let response = app()
            .oneshot(Request::get("/page").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(body_json(response).await.is_null());
    }
}
