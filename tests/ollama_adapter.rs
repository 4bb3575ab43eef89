mod common;

#[cfg(test)]
mod tests {
    use super::common::{llm_config, mock_server, refused_host};
    use emma::conversation::Role;
    use emma::llm::models::{ChatMessage, ChatOptions};
    use emma::llm::ollama::OllamaAdapter;
    use emma::llm::{AdapterFactory, LlmAdapter};
    use serde_json::Value;

    fn user(content: &str) -> ChatMessage {
        ChatMessage {
            role: Role::User,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn nested_and_flat_shapes_give_the_same_text() {
        let (host, server) = mock_server(vec![
            (200, r#"{"message":{"role":"assistant","content":" hi "}}"#.to_string()),
            (200, r#"{"response":"hi"}"#.to_string()),
        ])
        .await;
        let adapter = OllamaAdapter::new(&llm_config(&host));

        let first = adapter.generate_response(&[user("hello")], ChatOptions::default()).await;
        let second = adapter.generate_response(&[user("hello")], ChatOptions::default()).await;
        assert_eq!(first, "hi");
        assert_eq!(second, "hi");

        let captured = server.await.unwrap();
        assert_eq!(captured.len(), 2);
        assert!(captured[0].request_line.starts_with("POST /api/chat"));
    }

    #[tokio::test]
    async fn request_body_is_non_streaming_with_options() {
        let (host, server) = mock_server(vec![(200, r#"{"response":"ok"}"#.to_string())]).await;
        let adapter = OllamaAdapter::new(&llm_config(&host));

        let options = ChatOptions {
            max_tokens: Some(64),
            ..ChatOptions::default()
        };
        adapter.generate_response(&[user("hello")], options).await;

        let captured = server.await.unwrap();
        let body: Value = serde_json::from_str(&captured[0].body).unwrap();
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert!(body["messages"][0].get("timestamp").is_none());
        assert_eq!(body["options"]["num_predict"], 64);
        assert_eq!(body["options"]["top_k"], 40);
    }

    #[tokio::test]
    async fn refused_connection_becomes_error_text() {
        let adapter = OllamaAdapter::new(&llm_config(&refused_host()));
        let reply = adapter.generate_response(&[user("hello")], ChatOptions::default()).await;
        assert!(reply.starts_with("Error: "), "{reply}");
    }

    #[tokio::test]
    async fn non_success_status_becomes_error_text() {
        let (host, server) = mock_server(vec![(500, r#"{"error":"boom"}"#.to_string())]).await;
        let adapter = OllamaAdapter::new(&llm_config(&host));

        let reply = adapter.generate_response(&[user("hello")], ChatOptions::default()).await;
        assert!(reply.starts_with("Error: "), "{reply}");
        assert!(reply.contains("500"), "{reply}");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unusable_body_is_an_unexpected_format() {
        let (host, server) = mock_server(vec![(200, r#"{"done":true}"#.to_string())]).await;
        let adapter = OllamaAdapter::new(&llm_config(&host));

        let reply = adapter.generate_response(&[user("hello")], ChatOptions::default()).await;
        assert!(reply.starts_with("Error: Unexpected response format"), "{reply}");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn availability_follows_the_version_endpoint() {
        let down = OllamaAdapter::new(&llm_config(&refused_host()));
        assert!(!down.is_available().await);

        let (host, server) = mock_server(vec![
            (200, r#"{"version":"0.5.1"}"#.to_string()),
            (200, r#"{"version":"0.5.1"}"#.to_string()),
        ])
        .await;
        let up = OllamaAdapter::new(&llm_config(&host));
        assert!(up.is_available().await);
        assert_eq!(up.version().await.as_deref(), Some("0.5.1"));

        let captured = server.await.unwrap();
        assert!(captured[0].request_line.starts_with("GET /api/version"));
    }

    #[tokio::test]
    async fn analysis_sentinel_means_no_search() {
        let (host, server) = mock_server(vec![
            (200, r#"{"message":{"content":"NO_SEARCH"}}"#.to_string()),
            (200, r#"{"message":{"content":"  "}}"#.to_string()),
        ])
        .await;
        let adapter = OllamaAdapter::new(&llm_config(&host));

        assert_eq!(adapter.analyze_prompt("hola").await, None);
        assert_eq!(adapter.analyze_prompt("hola").await, None);

        let captured = server.await.unwrap();
        let body: Value = serde_json::from_str(&captured[0].body).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][0]["content"].as_str().unwrap().ends_with("Prompt: hola"));
        assert_eq!(body["options"]["num_predict"], 100);
    }

    #[tokio::test]
    async fn analysis_directive_is_returned_verbatim() {
        let (host, server) = mock_server(vec![(
            200,
            r#"{"message":{"content":"<search>weather Madrid</search>"}}"#.to_string(),
        )])
        .await;
        let adapter = OllamaAdapter::new(&llm_config(&host));

        assert_eq!(
            adapter.analyze_prompt("what is the weather in Madrid?").await.as_deref(),
            Some("<search>weather Madrid</search>")
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn analysis_failure_means_no_search() {
        let adapter = OllamaAdapter::new(&llm_config(&refused_host()));
        assert_eq!(adapter.analyze_prompt("hola").await, None);
    }

    #[test]
    fn factory_knows_only_ollama() {
        let mut config = llm_config("http://localhost:11434");
        assert_eq!(AdapterFactory::create_default(&config).unwrap().name(), "ollama");

        config.provider = "other".to_string();
        assert!(AdapterFactory::create_default(&config).is_none());
    }
}
