// End-to-end HTTP scenarios against the router, backed by the in-memory store

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use livraria_api::handlers::MISSING_FIELDS_MESSAGE;
use livraria_api::routes::create_router;
use livraria_api::state::AppState;
use livraria_common::config::Settings;
use livraria_common::db::memory::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app(store: &MemoryStore) -> Router {
    create_router(AppState::new(
        Arc::new(store.clone()),
        Settings::default(),
        None,
    ))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn text(body: &[u8]) -> String {
    String::from_utf8(body.to_vec()).unwrap()
}

fn livro(id: i64) -> Value {
    json!({
        "id": id,
        "titulo": "Vidas Secas",
        "autor": "Graciliano Ramos",
        "preco": 42.5,
        "imagem": "https://example.com/vidas-secas.jpg",
        "categoria_id": 1,
        "descricao": "Romance regionalista"
    })
}

#[tokio::test]
async fn create_category_then_list_includes_it() {
    let store = MemoryStore::new();
    let app = app(&store);

    let (status, body) = send(
        &app,
        json_request("POST", "/categorias", json!({"id": 1, "nome": "Ficção"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(text(&body), "Categoria cadastrada com sucesso!");

    let (status, body) = send(&app, empty_request("GET", "/categorias")).await;
    assert_eq!(status, StatusCode::OK);
    let categories: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(categories, json!([{"id": 1, "nome": "Ficção"}]));
}

#[tokio::test]
async fn create_book_missing_descricao_is_rejected() {
    let store = MemoryStore::new();
    let app = app(&store);
    let mut payload = livro(1);
    payload.as_object_mut().unwrap().remove("descricao");

    let (status, body) = send(&app, json_request("POST", "/livros", payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text(&body), MISSING_FIELDS_MESSAGE);
    assert_eq!(store.row_count("livros"), 0);
    assert_eq!(store.stats().opened, 0);
}

#[tokio::test]
async fn create_book_with_falsy_price_is_rejected() {
    let store = MemoryStore::new();
    let app = app(&store);
    let mut payload = livro(1);
    payload["preco"] = json!(0);

    let (status, _) = send(&app, json_request("POST", "/livros", payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.row_count("livros"), 0);
}

#[tokio::test]
async fn create_book_accepts_zero_strings_and_numeric_titles() {
    let store = MemoryStore::new();
    let app = app(&store);
    let mut payload = livro(9);
    payload["preco"] = json!("0");
    payload["titulo"] = json!(123);

    let (status, _) = send(&app, json_request("POST", "/livros", payload)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, empty_request("GET", "/livros/9")).await;
    let fetched: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched["titulo"], "123");
    assert_eq!(fetched["preco"], json!(0.0));
}

#[tokio::test]
async fn books_with_null_columns_are_still_listed() {
    let store = MemoryStore::new();
    let app = app(&store);
    send(&app, json_request("POST", "/livros", livro(1))).await;
    let mut legacy = livro(2);
    legacy["descricao"] = Value::Null;
    let Value::Object(row) = legacy.clone() else {
        unreachable!()
    };
    store.seed("livros", row);

    let (status, body) = send(&app, empty_request("GET", "/livros")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!([livro(1), legacy])
    );

    let (status, body) = send(&app, empty_request("GET", "/livros/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap()["descricao"], Value::Null);
}

#[tokio::test]
async fn non_numeric_id_is_rejected_before_the_store() {
    let store = MemoryStore::new();
    let app = app(&store);

    for request in [
        empty_request("GET", "/livros/abc"),
        empty_request("DELETE", "/livros/abc"),
        json_request("PUT", "/livros/abc", livro(1)),
        empty_request("DELETE", "/categorias/abc"),
    ] {
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert_eq!(store.stats().opened, 0);
}

#[tokio::test]
async fn create_then_get_book_round_trips() {
    let store = MemoryStore::new();
    let app = app(&store);

    let (status, body) = send(&app, json_request("POST", "/livros", livro(7))).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(created["message"], "Livro cadastrado com sucesso!");
    assert_eq!(created["result"]["affectedRows"], 1);

    let (status, body) = send(&app, empty_request("GET", "/livros/7")).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched, livro(7));

    let (_, body) = send(&app, empty_request("GET", "/livros")).await;
    let all: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(all, json!([livro(7)]));
}

#[tokio::test]
async fn get_missing_book_returns_empty_body() {
    let store = MemoryStore::new();
    let (status, body) = send(&app(&store), empty_request("GET", "/livros/404")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn update_then_get_reflects_new_fields() {
    let store = MemoryStore::new();
    let app = app(&store);
    send(&app, json_request("POST", "/livros", livro(2))).await;

    let changes = json!({
        "titulo": "São Bernardo",
        "autor": "Graciliano Ramos",
        "preco": 38.0,
        "imagem": "sao-bernardo.jpg",
        "descricao": "Romance",
        "categoria_id": 3
    });
    let (status, body) = send(&app, json_request("PUT", "/livros/2", changes.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(&body), "Livro atualizado com sucesso!");

    let (_, body) = send(&app, empty_request("GET", "/livros/2")).await;
    let mut expected = changes;
    expected["id"] = json!(2);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), expected);
}

#[tokio::test]
async fn delete_missing_book_succeeds() {
    let store = MemoryStore::new();
    let (status, body) = send(&app(&store), empty_request("DELETE", "/livros/5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(&body), "Livro excluído com sucesso!");
}

#[tokio::test]
async fn rename_and_delete_category() {
    let store = MemoryStore::new();
    let app = app(&store);
    send(
        &app,
        json_request("POST", "/categorias", json!({"id": 4, "nome": "Poesia"})),
    )
    .await;

    let (status, _) = send(
        &app,
        json_request("PUT", "/categorias/4", json!({"nome": "Poesia Moderna"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, empty_request("GET", "/categorias")).await;
    assert_eq!(
        serde_json::from_slice::<Value>(&body).unwrap(),
        json!([{"id": 4, "nome": "Poesia Moderna"}])
    );

    let (status, body) = send(&app, empty_request("DELETE", "/categorias/4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(&body), "Categoria excluída com sucesso!");
    assert_eq!(store.row_count("categorias"), 0);
}

#[tokio::test]
async fn duplicate_category_is_a_generic_server_error() {
    let store = MemoryStore::new();
    let app = app(&store);
    let payload = json!({"id": 1, "nome": "Ficção"});
    send(&app, json_request("POST", "/categorias", payload.clone())).await;

    let (status, body) = send(&app, json_request("POST", "/categorias", payload)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&body), "Erro interno do servidor.");
    assert_eq!(store.stats().open_now, 0);
}

#[tokio::test]
async fn unreachable_store_yields_500_for_every_read() {
    let store = MemoryStore::new();
    store.refuse_connections(true);
    let app = app(&store);

    let (status, body) = send(&app, empty_request("GET", "/livros")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&body), "Server ERROR");

    let (status, body) = send(&app, empty_request("GET", "/categorias")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&body), "Erro ao carregar categorias");

    let (status, _) = send(&app, empty_request("GET", "/health/store")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let store = MemoryStore::new();
    let request = Request::builder()
        .method("POST")
        .uri("/livros")
        .header("content-type", "application/json")
        .body(Body::from("{\"id\": 1,"))
        .unwrap();

    let (status, _) = send(&app(&store), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.stats().opened, 0);
}

#[tokio::test]
async fn health_endpoints_answer_ok() {
    let store = MemoryStore::new();
    let app = app(&store);

    let (status, body) = send(&app, empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text(&body), "OK");

    let (status, _) = send(&app, empty_request("GET", "/health/store")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.stats().closed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_each_own_their_connection() {
    let store = MemoryStore::new().with_latency(Duration::from_millis(25));
    let app = app(&store);
    send(&app, json_request("POST", "/livros", livro(1))).await;

    let requests: Vec<_> = (0..20)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { send(&app, empty_request("GET", "/livros")).await })
        })
        .collect();

    for request in requests {
        let (status, body) = request.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([livro(1)]));
    }

    let stats = store.stats();
    assert_eq!(stats.opened, 21);
    assert_eq!(stats.closed, 21);
    assert_eq!(stats.open_now, 0);
    assert!(stats.peak_open > 1);
}

#[tokio::test]
async fn request_timeout_still_closes_the_connection() {
    let store = MemoryStore::new().with_latency(Duration::from_secs(3));
    let mut settings = Settings::default();
    settings.server.request_timeout_seconds = 1;
    let app = create_router(AppState::new(Arc::new(store.clone()), settings, None));

    let (status, _) = send(&app, empty_request("GET", "/livros")).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    let stats = store.stats();
    assert_eq!(stats.opened, 1);
    assert_eq!(stats.closed, 1);
    assert_eq!(stats.open_now, 0);
}

proptest::proptest! {
    #![proptest_config(proptest::prelude::ProptestConfig::with_cases(16))]

    #[test]
    fn any_missing_book_field_is_rejected_without_insert(field in proptest::sample::select(vec![
        "id", "titulo", "autor", "preco", "imagem", "categoria_id", "descricao",
    ])) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let store = MemoryStore::new();
        let mut payload = livro(1);
        payload.as_object_mut().unwrap().remove(field);

        let (status, body) = runtime.block_on(send(&app(&store), json_request("POST", "/livros", payload)));

        proptest::prop_assert_eq!(status, StatusCode::BAD_REQUEST);
        proptest::prop_assert_eq!(text(&body), MISSING_FIELDS_MESSAGE);
        proptest::prop_assert_eq!(store.row_count("livros"), 0);
    }
}
