//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor with automatic validation.
///
/// Malformed bodies and bodies missing fields reject with 400 and the
/// `JSON_EXTRACTION` code; bodies that parse but fail `Validate` reject with
/// 400 and per-field details.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use axum::routing::post;
/// use axum_helpers::extractors::ValidatedJson;
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct Notify {
///     #[validate(email)]
///     to: String,
/// }
///
/// async fn notify(ValidatedJson(payload): ValidatedJson<Notify>) -> String {
///     format!("notifying {}", payload.to)
/// }
///
/// let app = Router::new().route("/notify", post(notify));
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        data.validate()?;
        Ok(ValidatedJson(data))
    }
}
