//! Axum extractors for sortable tables
//!
//! - [`RequestParams`] can be extracted directly from the query string
//! - [`ShapedQuery`] runs the shaper found in the router state and rejects
//!   the request with a JSON error when shaping fails

use axum::extract::{FromRef, FromRequestParts, Query};
use axum::http::request::Parts;
use std::sync::Arc;

use crate::core::error::{RequestError, SortableError};
use crate::core::params::RequestParams;
use crate::core::query::QueryDescriptor;
use crate::core::shaper::QueryShaper;

impl<S> FromRequestParts<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = SortableError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                SortableError::Request(RequestError::InvalidQueryString {
                    message: e.body_text(),
                })
            })?;

        Ok(RequestParams::from_pairs(pairs))
    }
}

/// Extractor yielding the shaped query for the current request
///
/// The router state must provide an `Arc<QueryShaper>` through [`FromRef`].
///
/// # Usage
///
/// ```rust,ignore
/// async fn list_users(
///     ShapedQuery(descriptor): ShapedQuery,
/// ) -> Json<QueryDescriptor> {
///     // descriptor.order_by, descriptor.conditions, descriptor.page ...
///     Json(descriptor)
/// }
///
/// let app = Router::new()
///     .route("/users", get(list_users))
///     .with_state(Arc::new(QueryShaper::new(config)?));
/// ```
#[derive(Debug, Clone)]
pub struct ShapedQuery(pub QueryDescriptor);

impl<S> FromRequestParts<S> for ShapedQuery
where
    Arc<QueryShaper>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = SortableError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = RequestParams::from_request_parts(parts, state).await?;
        let shaper = Arc::<QueryShaper>::from_ref(state);

        match shaper.shape(&params) {
            Ok(descriptor) => Ok(ShapedQuery(descriptor)),
            Err(e) => {
                tracing::debug!(error = %e, "rejecting table request");
                Err(e)
            }
        }
    }
}

// Allow dereferencing to the descriptor
impl std::ops::Deref for ShapedQuery {
    type Target = QueryDescriptor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
