use std::collections::HashMap;

use mockito::{Matcher, Server};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use weather_mcp::weather::{WeatherClient, WeatherConfig, WeatherTool};
use weather_mcp::{McpServer, ServerConfig, StdioTransport, ToolRegistry};

/// Run a server over an in-memory stream, feed it `lines`, close the input and
/// return every line the server wrote.
async fn exchange(base_url: &str, lines: &[impl AsRef<[u8]>]) -> Vec<Value> {
    let client = WeatherClient::new(WeatherConfig {
        base_url: base_url.to_string(),
        ..WeatherConfig::default()
    })
    .unwrap();
    let mut registry = ToolRegistry::new();
    registry.register(WeatherTool::new(client)).unwrap();
    let server = McpServer::new(ServerConfig::default(), registry);

    let (host, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);
    let (mut host_read, mut host_write) = tokio::io::split(host);

    let host_side = async move {
        for line in lines {
            host_write.write_all(line.as_ref()).await.unwrap();
            host_write.write_all(b"\n").await.unwrap();
        }
        host_write.shutdown().await.unwrap();

        let mut output = String::new();
        host_read.read_to_string(&mut output).await.unwrap();
        output
    };

    let (served, output) = tokio::join!(
        server.serve(StdioTransport::with_streams(server_read, server_write)),
        host_side
    );
    served.unwrap();

    output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn by_id(responses: &[Value]) -> HashMap<i64, &Value> {
    responses
        .iter()
        .filter_map(|response| Some((response["id"].as_i64()?, response)))
        .collect()
}

#[tokio::test]
async fn test_session() {
    let mut provider = Server::new_async().await;
    let mock = provider
        .mock("GET", "/London")
        .match_query(Matcher::UrlEncoded("format".into(), "j1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"current_condition":[{"temp_F":"59","temp_C":"15","weatherDesc":[{"value":"Partly cloudy"}],"humidity":"72","windspeedMiles":"8"}]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let responses = exchange(
        &provider.url(),
        &[
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","capabilities":{},"clientInfo":{"name":"test-host","version":"0.0.1"}}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"get_weather","arguments":{"city":"London"}}}"#,
        ],
    )
    .await;

    // One response per request, none for the notification.
    assert_eq!(responses.len(), 3);
    let responses = by_id(&responses);

    let init = &responses[&1]["result"];
    assert_eq!(init["protocolVersion"], "2025-06-18");
    assert_eq!(init["serverInfo"]["name"], "weather-server");
    assert_eq!(init["capabilities"]["tools"]["listChanged"], false);

    let tools = &responses[&2]["result"]["tools"];
    assert_eq!(tools.as_array().unwrap().len(), 1);
    assert_eq!(tools[0]["name"], "get_weather");
    assert_eq!(tools[0]["title"], "Weather Tool");
    assert_eq!(tools[0]["inputSchema"]["properties"]["city"]["type"], "string");

    let call = &responses[&3]["result"];
    assert_eq!(call["isError"], false);
    assert_eq!(call["content"][0]["type"], "text");
    let summary: Value = serde_json::from_str(call["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(
        summary,
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
async fn test_errors_on_the_wire() {
    let mut provider = Server::new_async().await;
    let failing = provider
        .mock("GET", "/Atlantis")
        .match_query(Matcher::Any)
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let responses = exchange(
        &provider.url(),
        &[
            "this is not json",
            r#"{"jsonrpc":"2.0","id":10,"method":"tools/call","params":{"name":"get_weather","arguments":{"city":""}}}"#,
            r#"{"jsonrpc":"2.0","id":11,"method":"tools/call","params":{"name":"get_forecast","arguments":{"city":"Oslo"}}}"#,
            r#"{"jsonrpc":"2.0","id":12,"method":"tools/call","params":{"name":"get_weather","arguments":{"city":"Atlantis"}}}"#,
            r#"{"jsonrpc":"2.0","id":13,"method":"prompts/list"}"#,
            r#"{"jsonrpc":"2.0","id":14,"method":"ping"}"#,
        ],
    )
    .await;

    assert_eq!(responses.len(), 6);

    let parse_error = responses
        .iter()
        .find(|response| response["id"].is_null())
        .unwrap();
    assert_eq!(parse_error["error"]["code"], -32700);

    let responses = by_id(&responses);
    assert_eq!(responses[&10]["error"]["code"], -32602);
    assert_eq!(responses[&11]["error"]["code"], -32602);

    let failed = &responses[&12]["result"];
    assert_eq!(failed["isError"], true);
    assert!(
        failed["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("404"),
        "{failed}"
    );

    assert_eq!(responses[&13]["error"]["code"], -32601);
    assert_eq!(responses[&14]["result"], json!({}));

    failing.assert_async().await;
}

#[tokio::test]
async fn test_invalid_utf8_does_not_stop_the_server() {
    let provider = Server::new_async().await;

    let responses = exchange(
        &provider.url(),
        &[
            b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\",\"x\":\"\xff\"}".as_slice(),
            b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}".as_slice(),
        ],
    )
    .await;

    assert_eq!(responses.len(), 2);
    assert!(responses[0]["id"].is_null());
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(by_id(&responses)[&2]["result"], json!({}));
}

#[tokio::test]
async fn test_null_id_is_an_invalid_request() {
    let provider = Server::new_async().await;

    let responses = exchange(
        &provider.url(),
        &[
            r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
        ],
    )
    .await;

    assert_eq!(responses.len(), 2);
    assert!(responses[0]["id"].is_null());
    assert_eq!(responses[0]["error"]["code"], -32600);
    assert_eq!(by_id(&responses)[&3]["result"], json!({}));
}
