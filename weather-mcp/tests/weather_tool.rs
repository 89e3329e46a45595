use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{Value, json};
use weather_mcp::ToolError;
use weather_mcp::tool::{Tool, ToolRegistry};
use weather_mcp::weather::{WeatherClient, WeatherConfig, WeatherError, WeatherQuery, WeatherTool};

const LONDON: &str = r#"{
    "current_condition": [{
        "temp_F": "59",
        "temp_C": "15",
        "weatherDesc": [{ "value": "Partly cloudy" }],
        "humidity": "72",
        "windspeedMiles": "8"
    }],
    "nearest_area": [],
    "weather": []
}"#;

fn tool_for(base_url: &str) -> WeatherTool {
    let client = WeatherClient::new(WeatherConfig {
        base_url: base_url.to_string(),
        ..WeatherConfig::default()
    })
    .unwrap();
    WeatherTool::new(client)
}

async fn provider_mock(server: &mut ServerGuard, path: &str, status: usize, body: &str) -> Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::UrlEncoded("format".into(), "j1".into()))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

fn summary_json(result: &weather_mcp::message::CallToolResult) -> Value {
    assert!(!result.is_error);
    assert_eq!(result.content.len(), 1);
    let text = result.content[0].as_text().expect("text content");
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn test_london_lookup() {
    let mut server = Server::new_async().await;
    let mock = provider_mock(&mut server, "/London", 200, LONDON).await;

    let tool = tool_for(&server.url());
    let result = tool.call(json!({ "city": "London" })).await.unwrap();

    assert_eq!(
        summary_json(&result),
        json!({
            "city": "London",
            "temperature": "59°F (15°C)",
            "condition": "Partly cloudy",
            "humidity": "72%",
            "wind": "8 mph"
        })
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_output_is_pretty_printed() {
    let mut server = Server::new_async().await;
    let _mock = provider_mock(&mut server, "/London", 200, LONDON).await;

    let result = tool_for(&server.url())
        .call(json!({ "city": "London" }))
        .await
        .unwrap();

    let text = result.content[0].as_text().unwrap();
    assert!(text.starts_with("{\n  \"city\": \"London\",\n"), "{text}");
}

#[tokio::test]
async fn test_city_is_percent_encoded_in_request_path() {
    let mut server = Server::new_async().await;
    let mock = provider_mock(&mut server, "/San%20Francisco", 200, LONDON).await;

    let result = tool_for(&server.url())
        .call(json!({ "city": "San Francisco" }))
        .await
        .unwrap();

    assert_eq!(summary_json(&result)["city"], "San Francisco");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_registered_tool_lookup() {
    let mut server = Server::new_async().await;
    let mock = provider_mock(&mut server, "/Paris", 200, LONDON).await;

    let mut registry = ToolRegistry::new();
    registry.register(tool_for(&server.url())).unwrap();

    let definition = &registry.list_tools()[0];
    assert_eq!(definition.name, "get_weather");
    assert_eq!(definition.title.as_deref(), Some("Weather Tool"));
    assert_eq!(definition.description, "Get current weather for a city");
    assert_eq!(definition.input_schema["required"], json!(["city"]));

    let result = registry
        .call_tool("get_weather", Some(json!({ "city": "Paris" })))
        .await
        .unwrap();
    assert_eq!(summary_json(&result)["city"], "Paris");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_lookup_returns_typed_summary() {
    let mut server = Server::new_async().await;
    let _mock = provider_mock(&mut server, "/London", 200, LONDON).await;

    let summary = tool_for(&server.url())
        .lookup(&WeatherQuery {
            city: "London".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(summary.temperature, "59°F (15°C)");
    assert_eq!(summary.wind, "8 mph");
}

#[tokio::test]
async fn test_invalid_city_makes_no_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let tool = tool_for(&server.url());
    for args in [
        json!({ "city": "" }),
        json!({ "city": "   " }),
        json!({}),
        json!({ "city": 12 }),
    ] {
        let error = tool.call(args.clone()).await.unwrap_err();
        assert!(
            matches!(error, ToolError::InvalidArguments { .. }),
            "{args} should be rejected, got {error:?}"
        );
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_current_condition_fails() {
    let mut server = Server::new_async().await;
    let mock = provider_mock(&mut server, "/London", 200, r#"{"current_condition": []}"#).await;

    let error = tool_for(&server.url())
        .call(json!({ "city": "London" }))
        .await
        .unwrap_err();

    assert!(matches!(error, ToolError::Failed(_)));
    assert!(error.to_string().contains("current_condition"), "{error}");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_absent_current_condition_fails() {
    let mut server = Server::new_async().await;
    let _mock = provider_mock(&mut server, "/London", 200, r#"{"weather": []}"#).await;

    let error = tool_for(&server.url())
        .lookup(&WeatherQuery {
            city: "London".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(error, WeatherError::MissingField("current_condition[0]")));
}

#[tokio::test]
async fn test_non_json_body_fails() {
    let mut server = Server::new_async().await;
    let _mock = provider_mock(&mut server, "/London", 200, "Unknown location; please try ~1.2,3.4").await;

    let error = tool_for(&server.url())
        .lookup(&WeatherQuery {
            city: "London".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(error, WeatherError::Decode(_)), "{error:?}");
}

#[tokio::test]
async fn test_error_status_fails_without_retry() {
    let mut server = Server::new_async().await;
    let mock = provider_mock(&mut server, "/London", 503, "").await;

    let error = tool_for(&server.url())
        .lookup(&WeatherQuery {
            city: "London".to_string(),
        })
        .await
        .unwrap_err();

    assert!(
        matches!(error, WeatherError::Status { status, .. } if status.as_u16() == 503),
        "{error:?}"
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_failure_fails() {
    // Nothing listens on port 1.
    let error = tool_for("http://127.0.0.1:1")
        .call(json!({ "city": "London" }))
        .await
        .unwrap_err();

    assert!(matches!(error, ToolError::Failed(_)));
    assert!(error.to_string().starts_with("Weather request failed"), "{error}");
}
