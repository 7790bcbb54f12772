//! HTTP tests driving the router in-process over both storage engines

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use hbnb_core::{EntityKind, Storage};
use hbnb_server::storage::{db, file, FileStorage};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

struct TestApp {
    dir: tempfile::TempDir,
    storage: Arc<dyn Storage>,
    app: NormalizePath<Router>,
}

impl TestApp {
    /// Router over a JSON file store
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path().join("file.json")));
        Self::with_storage(dir, storage)
    }

    /// Router over a fresh SQLite database
    async fn db() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(db::open(&dir.path().join("hbnb.db"), false).await.unwrap());
        Self::with_storage(dir, storage)
    }

    fn with_storage(dir: tempfile::TempDir, storage: Arc<dyn Storage>) -> Self {
        let app = hbnb_server::app(storage.clone());
        Self { dir, storage, app }
    }

    async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(json_request(method, uri, body)).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Create a record and return its id
    async fn create(&self, uri: &str, body: Value) -> String {
        let (status, created) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "{uri}: {created}");
        created["id"].as_str().unwrap().to_string()
    }

    async fn count(&self, kind: EntityKind) -> usize {
        self.storage.count(Some(kind)).await.unwrap()
    }
}

fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap()
}

/// Fire `n` creates at once and collect their statuses
async fn create_concurrently(t: &TestApp, uri: &str, n: usize) -> Vec<StatusCode> {
    let tasks: Vec<_> = (0..n)
        .map(|i| {
            let app = t.app.clone();
            let request = json_request(Method::POST, uri, Some(json!({ "name": format!("#{i}") })));
            tokio::spawn(async move { app.oneshot(request).await.unwrap().status() })
        })
        .collect();

    let mut statuses = Vec::with_capacity(n);
    for task in tasks {
        statuses.push(task.await.unwrap());
    }
    statuses
}

async fn engines() -> [TestApp; 2] {
    [TestApp::new(), TestApp::db().await]
}

fn error(message: &str) -> Value {
    json!({ "error": message })
}

fn ids(list: &Value) -> Vec<&str> {
    let mut ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_status_and_stats() {
    for t in engines().await {
        assert_eq!(t.get("/api/v1/status").await, (StatusCode::OK, json!({"status": "OK"})));

        t.create("/api/v1/states", json!({"name": "California"})).await;
        t.create("/api/v1/amenities", json!({"name": "Wifi"})).await;

        let (status, stats) = t.get("/api/v1/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            stats,
            json!({
                "amenities": 1,
                "cities": 0,
                "places": 0,
                "reviews": 0,
                "states": 1,
                "users": 0
            })
        );
    }
}

#[tokio::test]
async fn test_trailing_slash_and_unknown_route() {
    let t = TestApp::new();
    assert_eq!(t.get("/api/v1/status/").await.0, StatusCode::OK);
    assert_eq!(t.get("/api/v1/states/").await, (StatusCode::OK, json!([])));
    assert_eq!(t.get("/api/v1/nope").await, (StatusCode::NOT_FOUND, error("Not found")));
}

#[tokio::test]
async fn test_state_lifecycle() {
    for t in engines().await {
        let (status, created) = t.post("/api/v1/states", json!({"name": "California"})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["name"], "California");
        assert_eq!(created["__class__"], "State");
        let id = created["id"].as_str().unwrap();

        let (status, fetched) = t.get(&format!("/api/v1/states/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, listed) = t.get("/api/v1/states").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([created]));

        assert_eq!(t.count(EntityKind::State).await, 1);
        let (status, body) = t.delete(&format!("/api/v1/states/{id}")).await;
        assert_eq!((status, body), (StatusCode::OK, json!({})));
        assert_eq!(t.count(EntityKind::State).await, 0);
        assert_eq!(t.get(&format!("/api/v1/states/{id}")).await.0, StatusCode::NOT_FOUND);
        assert_eq!(t.delete(&format!("/api/v1/states/{id}")).await.0, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_created_dict_matches_payload() {
    for t in engines().await {
        let payload = json!({"email": "bob@hbnb.io", "password": "pwd", "first_name": "Bob"});
        let (_, created) = t.post("/api/v1/users", payload.clone()).await;
        let id = created["id"].as_str().unwrap();

        let (_, fetched) = t.get(&format!("/api/v1/users/{id}")).await;
        let mut dict = fetched.as_object().unwrap().clone();
        for key in ["id", "created_at", "updated_at"] {
            assert!(dict.remove(key).is_some(), "missing {key}");
        }
        assert_eq!(dict.remove("__class__"), Some(json!("User")));
        assert_eq!(Value::Object(dict), payload);
    }
}

#[tokio::test]
async fn test_create_validation() {
    for t in engines().await {

        assert_eq!(
            t.post("/api/v1/states", json!({"nom": "California"})).await,
            (StatusCode::BAD_REQUEST, error("Missing name"))
        );
        assert_eq!(
            t.post("/api/v1/states", json!({})).await,
            (StatusCode::BAD_REQUEST, error("Not a JSON"))
        );
        assert_eq!(
            t.post("/api/v1/states", json!(["California"])).await,
            (StatusCode::BAD_REQUEST, error("Not a JSON"))
        );
        assert_eq!(
            t.post("/api/v1/users", json!({"password": "pwd"})).await,
            (StatusCode::BAD_REQUEST, error("Missing email"))
        );
        assert_eq!(
            t.post("/api/v1/users", json!({"email": "a@b.c"})).await,
            (StatusCode::BAD_REQUEST, error("Missing password"))
        );
        assert_eq!(
            t.post("/api/v1/amenities", json!({"name": 42})).await,
            (StatusCode::BAD_REQUEST, error("Invalid name"))
        );

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/states")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from(r#"{"name": "California"}"#))
            .unwrap();
        assert_eq!(t.send(request).await, (StatusCode::BAD_REQUEST, error("Not a JSON")));

        assert_eq!(t.storage.count(None).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn test_update_ignores_protected_fields() {
    for t in engines().await {
        let (_, user) = t
            .post("/api/v1/users", json!({"email": "bob@hbnb.io", "password": "pwd"}))
            .await;
        let id = user["id"].as_str().unwrap();

        let (status, updated) = t
            .put(
                &format!("/api/v1/users/{id}"),
                json!({
                    "id": "forged",
                    "email": "eve@hbnb.io",
                    "created_at": "2000-01-01T00:00:00.000000",
                    "first_name": "Bobby"
                }),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], user["id"]);
        assert_eq!(updated["email"], "bob@hbnb.io");
        assert_eq!(updated["created_at"], user["created_at"]);
        assert_eq!(updated["first_name"], "Bobby");

        let (_, fetched) = t.get(&format!("/api/v1/users/{id}")).await;
        assert_eq!(fetched, updated);
    }
}

#[tokio::test]
async fn test_update_checks_existence_before_body() {
    let t = TestApp::new();
    assert_eq!(
        t.put("/api/v1/states/missing", json!({})).await,
        (StatusCode::NOT_FOUND, error("Not found"))
    );

    let id = t.create("/api/v1/states", json!({"name": "Utah"})).await;
    assert_eq!(
        t.put(&format!("/api/v1/states/{id}"), json!({})).await,
        (StatusCode::BAD_REQUEST, error("Not a JSON"))
    );
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    for t in engines().await {
        t.create("/api/v1/users", json!({"email": "bob@hbnb.io", "password": "a"}))
            .await;

        assert_eq!(
            t.post("/api/v1/users", json!({"email": "bob@hbnb.io", "password": "b"}))
                .await,
            (StatusCode::CONFLICT, error("Email already exists: bob@hbnb.io"))
        );
        assert_eq!(t.count(EntityKind::User).await, 1);
    }
}

#[tokio::test]
async fn test_cities_under_state() {
    for t in engines().await {
        assert_eq!(
            t.post("/api/v1/states/missing/cities", json!({"name": "Reno"})).await.0,
            StatusCode::NOT_FOUND
        );

        let state_id = t.create("/api/v1/states", json!({"name": "Nevada"})).await;
        let (status, city) = t
            .post(
                &format!("/api/v1/states/{state_id}/cities"),
                json!({"name": "Reno", "state_id": "elsewhere"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(city["state_id"], state_id.as_str());

        let (_, cities) = t.get(&format!("/api/v1/states/{state_id}/cities")).await;
        assert_eq!(cities, json!([city]));

        // state_id is fixed after creation
        let city_id = city["id"].as_str().unwrap();
        let (_, updated) = t
            .put(
                &format!("/api/v1/cities/{city_id}"),
                json!({"name": "Sparks", "state_id": "elsewhere"}),
            )
            .await;
        assert_eq!(updated["name"], "Sparks");
        assert_eq!(updated["state_id"], state_id.as_str());

        t.delete(&format!("/api/v1/states/{state_id}")).await;
        assert_eq!(t.get(&format!("/api/v1/cities/{city_id}")).await.0, StatusCode::NOT_FOUND);
    }
}

struct Fixture {
    state_id: String,
    city_id: String,
    user_id: String,
}

async fn fixture(t: &TestApp) -> Fixture {
    let state_id = t.create("/api/v1/states", json!({"name": "California"})).await;
    let city_id = t
        .create(
            &format!("/api/v1/states/{state_id}/cities"),
            json!({"name": "San Francisco"}),
        )
        .await;
    let user_id = t
        .create("/api/v1/users", json!({"email": "host@hbnb.io", "password": "pwd"}))
        .await;
    Fixture {
        state_id,
        city_id,
        user_id,
    }
}

async fn place(t: &TestApp, city_id: &str, user_id: &str, name: &str) -> String {
    t.create(
        &format!("/api/v1/cities/{city_id}/places"),
        json!({"user_id": user_id, "name": name}),
    )
    .await
}

#[tokio::test]
async fn test_place_creation_rules() {
    for t in engines().await {
        let f = fixture(&t).await;
        let places = format!("/api/v1/cities/{}/places", f.city_id);

        assert_eq!(
            t.post("/api/v1/cities/missing/places", json!({})).await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            t.post(&places, json!({"name": "Loft"})).await,
            (StatusCode::BAD_REQUEST, error("Missing user_id"))
        );
        assert_eq!(
            t.post(&places, json!({"user_id": f.user_id})).await,
            (StatusCode::BAD_REQUEST, error("Missing name"))
        );
        assert_eq!(
            t.post(&places, json!({"user_id": "nobody", "name": "Loft"})).await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            t.post(
                &places,
                json!({"user_id": f.user_id, "name": "Loft", "max_guest": "lots"})
            )
            .await,
            (StatusCode::BAD_REQUEST, error("Invalid max_guest"))
        );
        assert_eq!(t.count(EntityKind::Place).await, 0);

        let payload = json!({
            "user_id": f.user_id,
            "name": "Loft",
            "number_rooms": 2,
            "price_by_night": 120,
            "latitude": 37.77,
            "longitude": -122
        });
        let (status, place) = t.post(&places, payload).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(place["latitude"], json!(37.77));
        assert_eq!(place["longitude"], json!(-122));
        assert_eq!(place["city_id"], f.city_id.as_str());
        assert_eq!(place["number_rooms"], 2);

        let (_, listed) = t.get(&places).await;
        assert_eq!(listed, json!([place]));

        let place_id = place["id"].as_str().unwrap();
        let (_, updated) = t
            .put(
                &format!("/api/v1/places/{place_id}"),
                json!({"price_by_night": 99, "user_id": "other", "city_id": "other"}),
            )
            .await;
        assert_eq!(updated["price_by_night"], 99);
        assert_eq!(updated["user_id"], f.user_id.as_str());
        assert_eq!(updated["city_id"], f.city_id.as_str());
    }
}

#[tokio::test]
async fn test_reviews_under_place() {
    for t in engines().await {
        let f = fixture(&t).await;
        let place_id = place(&t, &f.city_id, &f.user_id, "Loft").await;
        let reviews = format!("/api/v1/places/{place_id}/reviews");

        assert_eq!(
            t.post(&reviews, json!({"text": "Great"})).await,
            (StatusCode::BAD_REQUEST, error("Missing user_id"))
        );
        assert_eq!(
            t.post(&reviews, json!({"user_id": "nobody", "text": "Great"})).await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            t.post(&reviews, json!({"user_id": f.user_id})).await,
            (StatusCode::BAD_REQUEST, error("Missing text"))
        );

        let (status, review) = t
            .post(&reviews, json!({"user_id": f.user_id, "text": "Great"}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(review["place_id"], place_id.as_str());

        let (_, listed) = t.get(&reviews).await;
        assert_eq!(listed, json!([review]));

        // deleting the owner takes the place and its reviews with it
        t.delete(&format!("/api/v1/users/{}", f.user_id)).await;
        assert_eq!(t.count(EntityKind::Place).await, 0);
        assert_eq!(t.count(EntityKind::Review).await, 0);
        assert_eq!(t.count(EntityKind::State).await, 1);
    }
}

#[tokio::test]
async fn test_place_amenity_links() {
    for t in engines().await {
        let f = fixture(&t).await;
        let place_id = place(&t, &f.city_id, &f.user_id, "Loft").await;
        let wifi_id = t.create("/api/v1/amenities", json!({"name": "Wifi"})).await;
        let link = format!("/api/v1/places/{place_id}/amenities/{wifi_id}");

        assert_eq!(t.delete(&link).await.0, StatusCode::NOT_FOUND);
        assert_eq!(
            t.post(&format!("/api/v1/places/{place_id}/amenities/missing"), json!({}))
                .await
                .0,
            StatusCode::NOT_FOUND
        );

        let (status, amenity) = t.post(&link, json!({})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(amenity["id"], wifi_id.as_str());
        assert_eq!(t.post(&link, json!({})).await.0, StatusCode::OK);

        let (_, listed) = t.get(&format!("/api/v1/places/{place_id}/amenities")).await;
        assert_eq!(ids(&listed), vec![wifi_id.as_str()]);

        assert_eq!(t.delete(&link).await, (StatusCode::OK, json!({})));
        let (_, listed) = t.get(&format!("/api/v1/places/{place_id}/amenities")).await;
        assert_eq!(listed, json!([]));
    }
}

#[tokio::test]
async fn test_places_search() {
    for t in engines().await {
        let f = fixture(&t).await;
        let other_city = t
            .create(
                &format!("/api/v1/states/{}/cities", f.state_id),
                json!({"name": "Oakland"}),
            )
            .await;
        let nevada = t.create("/api/v1/states", json!({"name": "Nevada"})).await;
        let reno = t
            .create(&format!("/api/v1/states/{nevada}/cities"), json!({"name": "Reno"}))
            .await;

        let loft = place(&t, &f.city_id, &f.user_id, "Loft").await;
        let house = place(&t, &other_city, &f.user_id, "House").await;
        let cabin = place(&t, &reno, &f.user_id, "Cabin").await;

        let wifi = t.create("/api/v1/amenities", json!({"name": "Wifi"})).await;
        let pool = t.create("/api/v1/amenities", json!({"name": "Pool"})).await;
        for (place_id, amenity_id) in [(&loft, &wifi), (&loft, &pool), (&cabin, &wifi)] {
            t.post(&format!("/api/v1/places/{place_id}/amenities/{amenity_id}"), json!({}))
                .await;
        }

        let mut all = vec![loft.as_str(), house.as_str(), cabin.as_str()];
        all.sort();
        let (status, found) = t.post("/api/v1/places_search", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&found), all);

        let mut california = vec![loft.as_str(), house.as_str()];
        california.sort();
        let (_, found) = t
            .post(
                "/api/v1/places_search",
                json!({"states": [f.state_id], "cities": [f.city_id]}),
            )
            .await;
        assert_eq!(ids(&found), california);

        let (_, found) = t
            .post("/api/v1/places_search", json!({"amenities": [wifi, pool]}))
            .await;
        assert_eq!(ids(&found), vec![loft.as_str()]);

        assert_eq!(
            t.post("/api/v1/places_search", json!([1])).await,
            (StatusCode::BAD_REQUEST, error("Not a JSON"))
        );
        assert_eq!(
            t.post("/api/v1/places_search", json!({"cities": "all"})).await,
            (StatusCode::BAD_REQUEST, error("Invalid cities"))
        );
    }
}

#[tokio::test]
async fn test_review_update_and_delete() {
    for t in engines().await {
        let f = fixture(&t).await;
        let place_id = place(&t, &f.city_id, &f.user_id, "Loft").await;
        let (_, review) = t
            .post(
                &format!("/api/v1/places/{place_id}/reviews"),
                json!({"user_id": f.user_id, "text": "Great"}),
            )
            .await;
        let review_id = review["id"].as_str().unwrap();
        let uri = format!("/api/v1/reviews/{review_id}");

        assert_eq!(
            t.put("/api/v1/reviews/missing", json!({"text": "Meh"})).await.0,
            StatusCode::NOT_FOUND
        );

        let (status, updated) = t
            .put(
                &uri,
                json!({
                    "text": "Even better",
                    "place_id": "elsewhere",
                    "user_id": "someone",
                    "id": "forged"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["text"], "Even better");
        assert_eq!(updated["id"], review["id"]);
        assert_eq!(updated["place_id"], place_id.as_str());
        assert_eq!(updated["user_id"], f.user_id.as_str());
        assert_eq!(t.get(&uri).await, (StatusCode::OK, updated));

        assert_eq!(t.delete(&uri).await, (StatusCode::OK, json!({})));
        assert_eq!(t.get(&uri).await.0, StatusCode::NOT_FOUND);
        assert_eq!(t.delete(&uri).await.0, StatusCode::NOT_FOUND);
        assert_eq!(t.count(EntityKind::Place).await, 1);
    }
}

#[tokio::test]
async fn test_amenity_update_and_delete() {
    for t in engines().await {
        let f = fixture(&t).await;
        let place_id = place(&t, &f.city_id, &f.user_id, "Loft").await;
        let wifi_id = t.create("/api/v1/amenities", json!({"name": "Wifi"})).await;
        let uri = format!("/api/v1/amenities/{wifi_id}");
        t.post(&format!("/api/v1/places/{place_id}/amenities/{wifi_id}"), json!({}))
            .await;

        assert_eq!(
            t.put("/api/v1/amenities/missing", json!({"name": "Pool"})).await,
            (StatusCode::NOT_FOUND, error("Not found"))
        );
        assert_eq!(
            t.put(&uri, json!({"name": 5})).await,
            (StatusCode::BAD_REQUEST, error("Invalid name"))
        );

        let (status, updated) = t.put(&uri, json!({"name": "Fast wifi"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Fast wifi");
        assert_eq!(t.get(&uri).await, (StatusCode::OK, updated));

        // removing an amenity drops it from every place
        assert_eq!(t.delete(&uri).await, (StatusCode::OK, json!({})));
        assert_eq!(t.get(&uri).await.0, StatusCode::NOT_FOUND);
        let (_, linked) = t.get(&format!("/api/v1/places/{place_id}/amenities")).await;
        assert_eq!(linked, json!([]));
        assert_eq!(t.count(EntityKind::Place).await, 1);
    }
}

#[tokio::test]
async fn test_delete_place() {
    for t in engines().await {
        let f = fixture(&t).await;
        let loft = place(&t, &f.city_id, &f.user_id, "Loft").await;
        let barn = place(&t, &f.city_id, &f.user_id, "Barn").await;
        t.create(
            &format!("/api/v1/places/{loft}/reviews"),
            json!({"user_id": f.user_id, "text": "Great"}),
        )
        .await;

        let uri = format!("/api/v1/places/{loft}");
        assert_eq!(t.delete(&uri).await, (StatusCode::OK, json!({})));
        assert_eq!(t.get(&uri).await, (StatusCode::NOT_FOUND, error("Not found")));
        assert_eq!(t.delete(&uri).await.0, StatusCode::NOT_FOUND);

        assert_eq!(t.count(EntityKind::Review).await, 0);
        assert_eq!(t.count(EntityKind::City).await, 1);
        assert_eq!(t.count(EntityKind::User).await, 1);
        let (_, left) = t.get(&format!("/api/v1/cities/{}/places", f.city_id)).await;
        assert_eq!(ids(&left), vec![barn.as_str()]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates() {
    for t in engines().await {
        let statuses = create_concurrently(&t, "/api/v1/states", 50).await;
        assert!(statuses.iter().all(|s| *s == StatusCode::CREATED), "{statuses:?}");
        assert_eq!(t.count(EntityKind::State).await, 50);
    }

    // every create is on disk, not just in memory
    let t = TestApp::new();
    let statuses = create_concurrently(&t, "/api/v1/amenities", 50).await;
    assert!(statuses.iter().all(|s| *s == StatusCode::CREATED), "{statuses:?}");
    let reopened = file::open(&t.dir.path().join("file.json")).await.unwrap();
    assert_eq!(reopened.count(Some(EntityKind::Amenity)).await.unwrap(), 50);
}
