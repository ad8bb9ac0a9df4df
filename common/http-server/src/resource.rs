use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common_database::{Record, Store, StoreError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::error::ApiError;

/// A record exposed over HTTP as `/{PATH}` (create, list) and `/{PATH}/:id` (read).
pub trait Resource: Record + Serialize {
    /// Collection path segment, without slashes.
    const PATH: &'static str;

    /// Whether `GET /{PATH}` lists every record.
    const LISTABLE: bool = false;

    /// The JSON body accepted by create.
    type Payload: DeserializeOwned + Send + 'static;

    /// Turn a decoded payload into something insertable, or explain why it can't be.
    fn prepare(payload: Self::Payload) -> Result<Self::New, String>;
}

#[derive(Clone)]
pub struct ResourceState<R: Record> {
    store: Arc<dyn Store<R>>,
    expose_store_errors: bool,
}

impl<R: Record> ResourceState<R> {
    pub fn new(store: Arc<dyn Store<R>>) -> Self {
        Self {
            store,
            expose_store_errors: true,
        }
    }

    /// When false, store failures answer with a generic message instead of the store's text.
    pub fn expose_store_errors(mut self, expose: bool) -> Self {
        self.expose_store_errors = expose;
        self
    }

    fn store_failure(&self, operation: &'static str, e: StoreError) -> ApiError {
        error!(table = R::TABLE, operation, error = %e, "store operation failed");
        if self.expose_store_errors {
            ApiError::StoreFailure(e.to_string())
        } else {
            ApiError::StoreFailure("internal error".to_owned())
        }
    }
}

pub async fn create_record<R: Resource>(
    State(state): State<ResourceState<R>>,
    payload: Result<Json<R::Payload>, JsonRejection>,
) -> Result<(StatusCode, Json<R>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        debug!(table = R::TABLE, error = %rejection, "rejected request body");
        ApiError::InvalidInput(rejection.body_text())
    })?;
    let new = R::prepare(payload).map_err(ApiError::InvalidInput)?;

    let record = state
        .store
        .insert_returning_id(new)
        .await
        .map_err(|e| state.store_failure("insert", e))?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_record<R: Resource>(
    State(state): State<ResourceState<R>>,
    Path(raw_id): Path<String>,
) -> Result<Json<R>, ApiError> {
    // Anything that isn't an integer id can't name a row.
    let Ok(id) = raw_id.parse::<i64>() else {
        return Err(ApiError::NotFound);
    };

    match state.store.query_one(id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(ApiError::NotFound),
        Err(e) => Err(state.store_failure("query_one", e)),
    }
}

pub async fn list_records<R: Resource>(
    State(state): State<ResourceState<R>>,
) -> Result<Json<Vec<R>>, ApiError> {
    state
        .store
        .query_many()
        .await
        .map(Json)
        .map_err(|e| state.store_failure("query_many", e))
}

/// Routes for one resource, with its state already applied.
pub fn resource_routes<R: Resource>(state: ResourceState<R>) -> Router {
    let mut collection = post(create_record::<R>);
    if R::LISTABLE {
        collection = collection.get(list_records::<R>);
    }

    Router::new()
        .route(&format!("/{}", R::PATH), collection)
        .route(&format!("/{}/:id", R::PATH), get(get_record::<R>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use common_database::{MemoryStore, Value};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use serde_json::json;
    use sqlx::FromRow;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
    struct Tag {
        id: i64,
        label: String,
    }

    #[derive(Deserialize)]
    struct TagPayload {
        label: String,
    }

    impl Record for Tag {
        const TABLE: &'static str = "tags";
        const COLUMNS: &'static [&'static str] = &["id", "label"];
        type New = String;

        fn insert_values(new: &String) -> Vec<(&'static str, Value)> {
            vec![("label", Value::Text(new.clone()))]
        }

        fn from_new(id: i64, label: String) -> Self {
            Tag { id, label }
        }

        fn id(&self) -> i64 {
            self.id
        }
    }

    impl Resource for Tag {
        const PATH: &'static str = "tags";
        type Payload = TagPayload;

        fn prepare(payload: TagPayload) -> Result<String, String> {
            if payload.label.is_empty() {
                return Err("label must not be empty".to_owned());
            }
            Ok(payload.label)
        }
    }

    fn routes() -> (Router, Arc<MemoryStore<Tag>>) {
        let store = Arc::new(MemoryStore::<Tag>::new());
        let state = ResourceState::<Tag>::new(store.clone());
        (resource_routes(state), store)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn prepare_rejection_is_a_bad_request() {
        let (app, store) = routes();

        let response = app
            .oneshot(post_json("/tags", r#"{"label":""}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "label must not be empty" })
        );
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn listing_is_not_mounted_unless_listable() {
        let (app, _) = routes();

        let response = app
            .oneshot(Request::builder().uri("/tags").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn out_of_range_id_is_not_found() {
        let (app, _) = routes();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/tags/99999999999999999999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "error": "not found" }));
    }
}
