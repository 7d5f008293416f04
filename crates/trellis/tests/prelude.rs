use serde_json::json;
use trellis::prelude::*;
use trellis_test::TestClient;

#[derive(Debug, Default, Deserialize)]
struct Greet {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Serialize)]
struct Greeting {
    message: String,
}

async fn greet(_ctx: RequestContext, req: Greet) -> Result<Greeting, HandlerError> {
    if req.name.is_empty() {
        return Err(HandlerError::validation("name is required"));
    }
    Ok(Greeting {
        message: format!("hello, {}", req.name),
    })
}

fn app() -> TestClient {
    let config = TrellisConfig::default();
    let mut adapter = AxumAdapter::from_config(&config);
    adapter
        .add_route(Route::typed(
            Method::GET,
            "/greet/{name}",
            greet,
            Some(Operation::new("greet")),
        ))
        .unwrap();
    adapter
        .add_route(Route::typed(Method::GET, "/greet", greet, None))
        .unwrap();
    TestClient::new(adapter.into_router())
}

#[tokio::test]
async fn prelude_wires_a_typed_service() {
    app()
        .get("/greet/ada")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_json_field("message", &json!("hello, ada"));
}

#[tokio::test]
async fn handler_errors_use_the_envelope() {
    app()
        .get("/greet?name=")
        .send()
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_json_field("error.code", &json!("VALIDATION_ERROR"));

    app()
        .get("/greet?name=grace")
        .send()
        .await
        .assert_json_field("message", &json!("hello, grace"));
}
