use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use collab_core::ids::{BoardId, ObjectId};

use crate::error::StoreError;
use crate::model::{BoardObject, ObjectPatch};
use crate::store::BoardStore;

const TABLE: &str = "board_objects";
const SELECT_COLUMNS: &str = "id,board_id,type,x,y,width,height,rotation,color,text,z_index,metadata";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Board store backed by a Supabase project's PostgREST endpoint, using the
/// service-role key.
pub struct SupabaseBoardStore {
    client: Client,
    table_url: String,
    service_key: SecretString,
}

impl SupabaseBoardStore {
    pub fn new(project_url: &str, service_key: SecretString) -> Result<Self, StoreError> {
        let project_url = project_url.trim_end_matches('/');
        if project_url.is_empty() {
            return Err(StoreError::Config("supabase url is empty".into()));
        }
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            table_url: format!("{project_url}/rest/v1/{TABLE}"),
            service_key,
        })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        let key = self.service_key.expose_secret();
        req.header("apikey", key)
            .header("Authorization", format!("Bearer {key}"))
    }

    /// Send, fail on non-2xx, and decode the returned row list.
    async fn rows(&self, req: RequestBuilder) -> Result<Vec<BoardObject>, StoreError> {
        let resp = self.authed(req).send().await?;
        let resp = check_status(resp).await?;
        resp.json::<Vec<BoardObject>>()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

async fn check_status(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl BoardStore for SupabaseBoardStore {
    fn name(&self) -> &str {
        "supabase"
    }

    #[instrument(skip(self, object), fields(board_id = %object.board_id, object_id = %object.id))]
    async fn insert_object(&self, object: BoardObject) -> Result<BoardObject, StoreError> {
        let req = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(&object);
        self.rows(req)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("insert of {} returned no rows", object.id)))
    }

    #[instrument(skip(self, patch), fields(board_id = %board_id, object_id = %id))]
    async fn update_object(
        &self,
        board_id: &BoardId,
        id: &ObjectId,
        patch: &ObjectPatch,
    ) -> Result<bool, StoreError> {
        let req = self
            .client
            .patch(&self.table_url)
            .query(&[
                ("id", format!("eq.{id}")),
                ("board_id", format!("eq.{board_id}")),
            ])
            .header("Prefer", "return=representation")
            .json(&patch.to_json());
        let updated = self.rows(req).await?;
        Ok(!updated.is_empty())
    }

    #[instrument(skip(self, ids), fields(board_id = %board_id, count = ids.len()))]
    async fn delete_objects(&self, board_id: &BoardId, ids: &[ObjectId]) -> Result<usize, StoreError> {
        let mut removed = 0;
        for id in ids {
            let req = self
                .client
                .delete(&self.table_url)
                .query(&[
                    ("id", format!("eq.{id}")),
                    ("board_id", format!("eq.{board_id}")),
                ])
                .header("Prefer", "return=representation");
            removed += self.rows(req).await?.len();
        }
        debug!(removed, "deleted objects");
        Ok(removed)
    }

    #[instrument(skip(self), fields(board_id = %board_id))]
    async fn list_objects(&self, board_id: &BoardId) -> Result<Vec<BoardObject>, StoreError> {
        let req = self.client.get(&self.table_url).query(&[
            ("select", SELECT_COLUMNS.to_string()),
            ("board_id", format!("eq.{board_id}")),
            ("order", "z_index.asc".to_string()),
        ]);
        self.rows(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    use crate::model::{NewObject, ObjectKind};

    /// In-process stand-in for the PostgREST table endpoint.
    #[derive(Clone, Default)]
    struct FakeTable {
        rows: Arc<Mutex<Vec<Value>>>,
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("apikey").is_some_and(|v| v == "service-key")
            && headers
                .get("authorization")
                .is_some_and(|v| v == "Bearer service-key")
    }

    fn row_matches(row: &Value, q: &HashMap<String, String>) -> bool {
        ["id", "board_id"].iter().all(|col| match q.get(*col) {
            Some(filter) => filter.strip_prefix("eq.") == row[*col].as_str(),
            None => true,
        })
    }

    async fn insert(State(t): State<FakeTable>, headers: HeaderMap, Json(row): Json<Value>) -> Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        t.rows.lock().push(row.clone());
        (StatusCode::CREATED, Json(json!([row]))).into_response()
    }

    async fn list(
        State(t): State<FakeTable>,
        headers: HeaderMap,
        Query(q): Query<HashMap<String, String>>,
    ) -> Response {
        if !authorized(&headers) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        assert_eq!(q.get("order").map(String::as_str), Some("z_index.asc"));
        let mut rows: Vec<Value> = t.rows.lock().iter().filter(|r| row_matches(r, &q)).cloned().collect();
        rows.sort_by_key(|r| r["z_index"].as_i64().unwrap_or_default());
        Json(Value::Array(rows)).into_response()
    }

    async fn update(
        State(t): State<FakeTable>,
        Query(q): Query<HashMap<String, String>>,
        Json(patch): Json<Value>,
    ) -> Response {
        let mut rows = t.rows.lock();
        let mut changed = Vec::new();
        for row in rows.iter_mut().filter(|r| row_matches(r, &q)) {
            for (k, v) in patch.as_object().into_iter().flatten() {
                row[k] = v.clone();
            }
            changed.push(row.clone());
        }
        Json(Value::Array(changed)).into_response()
    }

    async fn delete(State(t): State<FakeTable>, Query(q): Query<HashMap<String, String>>) -> Response {
        let mut rows = t.rows.lock();
        let (gone, kept): (Vec<Value>, Vec<Value>) = rows.drain(..).partition(|r| row_matches(r, &q));
        *rows = kept;
        Json(Value::Array(gone)).into_response()
    }

    async fn fake_supabase() -> (SupabaseBoardStore, FakeTable) {
        let table = FakeTable::default();
        let router = Router::new()
            .route(
                "/rest/v1/board_objects",
                get(list).post(insert).patch(update).delete(delete),
            )
            .with_state(table.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        let store =
            SupabaseBoardStore::new(&format!("http://{addr}/"), SecretString::from("service-key")).unwrap();
        (store, table)
    }

    fn note(text: &str, z: i64) -> BoardObject {
        let mut obj = BoardObject::create(
            BoardId::from_raw("board-1"),
            NewObject {
                text: Some(text.into()),
                ..NewObject::new(ObjectKind::StickyNote)
            },
        );
        obj.z_index = z;
        obj
    }

    #[test]
    fn empty_url_rejected() {
        let err = SupabaseBoardStore::new("", SecretString::from("k")).err().unwrap();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[tokio::test]
    async fn insert_and_list_roundtrip_through_rest() {
        let (store, table) = fake_supabase().await;
        store.insert_object(note("second", 20)).await.unwrap();
        let first = store.insert_object(note("first", 10)).await.unwrap();
        assert_eq!(table.rows.lock().len(), 2);
        assert_eq!(table.rows.lock()[1]["type"], "sticky_note");

        let listed = store.list_objects(&BoardId::from_raw("board-1")).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].text, "second");
    }

    #[tokio::test]
    async fn update_missing_object_returns_false() {
        let (store, _table) = fake_supabase().await;
        let obj = store.insert_object(note("a", 1)).await.unwrap();
        let board = BoardId::from_raw("board-1");

        assert!(store
            .update_object(&board, &obj.id, &ObjectPatch::Text("b".into()))
            .await
            .unwrap());
        assert!(!store
            .update_object(&board, &ObjectId::from_raw("ghost"), &ObjectPatch::Text("b".into()))
            .await
            .unwrap());
        let listed = store.list_objects(&board).await.unwrap();
        assert_eq!(listed[0].text, "b");
    }

    #[tokio::test]
    async fn delete_counts_removed_rows() {
        let (store, table) = fake_supabase().await;
        let a = store.insert_object(note("a", 1)).await.unwrap();
        store.insert_object(note("b", 2)).await.unwrap();

        let removed = store
            .delete_objects(&BoardId::from_raw("board-1"), &[a.id, ObjectId::from_raw("ghost")])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(table.rows.lock().len(), 1);
    }

    #[tokio::test]
    async fn wrong_key_surfaces_http_error() {
        let (store, _table) = fake_supabase().await;
        let bad = SupabaseBoardStore {
            service_key: SecretString::from("wrong"),
            ..store
        };
        let err = bad.list_objects(&BoardId::from_raw("board-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Http { status: 401, .. }));
    }
}
