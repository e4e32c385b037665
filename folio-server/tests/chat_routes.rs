use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use folio_rag::{
    ChatService, CompletionDispatcher, CompletionRequest, CompletionService, DispatchConfig,
    Document, EmbeddingProvider, InMemoryConversationLogger, InMemoryVectorStore, RagError,
    RagPipeline, Result, StaticContentSource, TokenStream,
};
use folio_server::{AppState, SESSION_HEADER, app_router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

#[derive(Default)]
struct FlatEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for FlatEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

enum Reply {
    Tokens(&'static [&'static str]),
    BreaksAfter(&'static str),
    Refuses,
}

struct FakeCompletion {
    reply: Reply,
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionService for FakeCompletion {
    fn name(&self) -> &str {
        "fake"
    }

    async fn stream_complete(&self, _request: CompletionRequest) -> Result<TokenStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let error = || RagError::CompletionError {
            service: "fake".into(),
            message: "upstream closed".into(),
        };
        match self.reply {
            Reply::Tokens(tokens) => Ok(Box::pin(futures::stream::iter(
                tokens.iter().map(|t| Ok::<_, RagError>(t.to_string())),
            ))),
            Reply::BreaksAfter(token) => Ok(Box::pin(async_stream::stream! {
                yield Ok(token.to_string());
                yield Err(error());
            })),
            Reply::Refuses => Err(error()),
        }
    }
}

struct Fixture {
    app: Router,
    embedder: Arc<FlatEmbedder>,
    completion: Arc<FakeCompletion>,
    logger: Arc<InMemoryConversationLogger>,
}

async fn fixture(reply: Reply) -> Fixture {
    let embedder = Arc::new(FlatEmbedder::default());
    let pipeline = RagPipeline::builder()
        .embedding_provider(embedder.clone())
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .expect("pipeline");
    let content = StaticContentSource::new(vec![Document::new(
        "alaska",
        "Alaska Airlines case study",
        "After the merger I folded the Virgin America booking flow into Alaska's.",
    )]);
    pipeline.index(&content).await.expect("index content");

    let logger = Arc::new(InMemoryConversationLogger::new());
    let completion = Arc::new(FakeCompletion { reply, calls: AtomicUsize::new(0) });
    let dispatcher =
        CompletionDispatcher::new(completion.clone(), logger.clone(), DispatchConfig::default());
    let chat = ChatService::new(Arc::new(pipeline), dispatcher, logger.clone());
    Fixture { app: app_router(AppState::new(chat)), embedder, completion, logger }
}

async fn app(reply: Reply) -> Router {
    fixture(reply).await.app
}

fn chat_request(body: Value) -> Request<Body> {
    Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_json(body: Body) -> Value {
    let bytes = body.collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app(Reply::Tokens(&[])).await;
    let response =
        app.oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response.into_body()).await,
        json!({"status": "ok", "service": "folio-server"})
    );
}

#[tokio::test]
async fn chat_streams_plain_text_and_echoes_session() {
    let app = app(Reply::Tokens(&["I merged ", "the booking ", "flows."])).await;
    let response = app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "What happened after the Alaska merger?"}],
            "sessionId": "visitor-42"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(response.headers()[SESSION_HEADER], "visitor-42");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"I merged the booking flows.");
}

#[tokio::test]
async fn chat_mints_a_session_when_none_is_sent() {
    let app = app(Reply::Tokens(&["Hi."])).await;
    let response = app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "Who are you?"}]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let minted = response.headers()[SESSION_HEADER].to_str().unwrap();
    assert_eq!(minted.len(), 36);
}

#[tokio::test]
async fn empty_history_is_a_bad_request() {
    let app = app(Reply::Tokens(&["unused"])).await;
    let response = app.oneshot(chat_request(json!({"messages": []}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("messages must not be empty"));
}

#[tokio::test]
async fn trailing_assistant_message_is_a_bad_request() {
    let app = app(Reply::Tokens(&["unused"])).await;
    let response = app
        .oneshot(chat_request(json!({
            "messages": [
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello!"}
            ]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app(Reply::Tokens(&["unused"])).await;
    let request = Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"messages\": [{\"role\": \"robot\"}]}"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response.into_body()).await["error"].is_string());
}

#[tokio::test]
async fn refused_completion_is_an_opaque_server_error() {
    let app = app(Reply::Refuses).await;
    let response = app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "Tell me about Virgin America"}]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response.into_body()).await,
        json!({"error": "failed to process chat request"})
    );
}

#[tokio::test]
async fn mid_stream_failure_cuts_the_body_short() {
    let app = app(Reply::BreaksAfter("I led ")).await;
    let response = app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "Tell me about Virgin America"}]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.into_body().collect().await.is_err());
}

#[tokio::test]
async fn unusable_session_id_is_rejected_before_retrieval() {
    let fixture = fixture(Reply::Tokens(&["unused"])).await;
    let indexing_embeds = fixture.embedder.calls.load(Ordering::SeqCst);

    let response = fixture
        .app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "hello"}],
            "sessionId": "a\u{1}b"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fixture.embedder.calls.load(Ordering::SeqCst), indexing_embeds);
    assert_eq!(fixture.completion.calls.load(Ordering::SeqCst), 0);
    assert!(fixture.logger.messages().await.is_empty());
}
