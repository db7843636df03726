use super::*;

fn conversation() -> Vec<Message> {
    vec![
        Message::user("book a table for two"),
        Message::assistant("which evening?"),
        Message::tool_response("call_1", "slots: fri, sat"),
    ]
}

#[test]
fn test_transcript_format() {
    let transcript = format_transcript(&conversation());
    assert_eq!(
        transcript,
        "User: book a table for two\n\n\
         Assistant: which evening?\n\n\
         Tool result (id: call_1): slots: fri, sat\n\n"
    );
}

#[tokio::test]
async fn test_summary_prompt_and_record() {
    let mut backend = MockCompletionBackend::new();
    backend
        .expect_complete()
        .withf(|messages| {
            messages.len() == 2
                && messages[0].role == MessageRole::System
                && messages[0].content == SUMMARY_PROMPT
                && messages[1].content.contains("book a table")
        })
        .times(1)
        .returning(|_| Ok("  User wants a table for two.  ".to_string()));

    let compressor = LlmCompressor::summary(Arc::new(backend));
    let summary = compressor.compress(&conversation()).await.unwrap();

    assert_eq!(summary.role, MessageRole::Assistant);
    assert_eq!(summary.content, "User wants a table for two.");
    assert_eq!(summary.name.as_deref(), Some("summary"));
}

#[tokio::test]
async fn test_symbols_mode_uses_symbol_prompt() {
    let mut backend = MockCompletionBackend::new();
    backend
        .expect_complete()
        .withf(|messages| messages[0].content == SYMBOLS_PROMPT)
        .returning(|_| Ok("user: table x2\nassistant: ask evening".to_string()));

    let compressor = LlmCompressor::symbols(Arc::new(backend));
    let symbols = compressor.compress(&conversation()).await.unwrap();
    assert_eq!(symbols.content.lines().count(), 2);
    assert_eq!(symbols.name.as_deref(), Some("symbols"));
}

#[tokio::test]
async fn test_backend_failure_propagates() {
    let mut backend = MockCompletionBackend::new();
    backend
        .expect_complete()
        .returning(|_| Err(Error::Compression("provider down".to_string())));

    let compressor = LlmCompressor::summary(Arc::new(backend));
    assert!(matches!(
        compressor.compress(&conversation()).await,
        Err(Error::Compression(_))
    ));
}

#[tokio::test]
async fn test_empty_completion_is_an_error() {
    let mut backend = MockCompletionBackend::new();
    backend.expect_complete().returning(|_| Ok("   ".to_string()));

    let compressor = LlmCompressor::summary(Arc::new(backend));
    assert!(compressor.compress(&conversation()).await.is_err());
}

#[tokio::test]
async fn test_empty_input_skips_backend() {
    let mut backend = MockCompletionBackend::new();
    backend.expect_complete().never();

    let compressor = LlmCompressor::summary(Arc::new(backend));
    assert!(compressor.compress(&[]).await.is_err());
}
