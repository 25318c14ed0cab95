use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IdentitySchema {
    #[validate(length(min = 1, max = 255))]
    pub id: String,
    #[validate(length(min = 1, max = 128))]
    pub username: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 128))]
    pub first_name: Option<String>,
    #[validate(length(max = 128))]
    pub last_name: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(url)]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewWishlistSchema {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateWishlistSchema {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Prices are in cents
#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewItemSchema {
    #[validate(length(min = 1, max = 500))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub current_price: u64,
    /// Defaults to the current price
    pub original_price: Option<u64>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(url)]
    pub product_url: String,
    #[validate(length(min = 1, max = 128))]
    pub store: String,
    #[validate(length(min = 1, max = 128))]
    pub category: String,
    pub is_favorite: Option<bool>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateItemSchema {
    #[validate(length(min = 1, max = 500))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub current_price: Option<u64>,
    pub original_price: Option<u64>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(url)]
    pub product_url: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub store: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub category: Option<String>,
    pub is_favorite: Option<bool>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewAlertSchema {
    #[validate(range(min = 1))]
    pub target_price: u64,
    /// Defaults to true
    pub is_active: Option<bool>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAlertSchema {
    #[validate(range(min = 1))]
    pub target_price: Option<u64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchSchema {
    #[validate(length(min = 1, max = 200))]
    pub query: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScrapeSchema {
    /// Searches for the item's name when absent
    #[validate(length(max = 200))]
    pub query: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShareSchema {
    #[validate(length(min = 1, max = 128))]
    pub username: String,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| ServerError::Validation(e.body_text()))?;

        extracted_json
            .0
            .validate()
            .map_err(|e| ServerError::Validation(e.to_string()))?;

        Ok(Self(extracted_json.0))
    }
}

/// Like [ValidatedJson], but an empty body yields `None`.
/// A body that is present still has to parse and validate.
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<S, T> FromRequest<S> for OptionalJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ServerError::Validation(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }

        let Json(value) =
            Json::<T>::from_bytes(&bytes).map_err(|e| ServerError::Validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| ServerError::Validation(e.to_string()))?;

        Ok(Self(Some(value)))
    }
}
