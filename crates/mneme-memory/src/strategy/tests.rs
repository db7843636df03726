use super::*;
use crate::compressor::{Compressor, MockCompressor};
use crate::error::Error;

fn conversation() -> Vec<Message> {
    vec![
        Message::system("system"),
        Message::user("u1"),
        Message::assistant("a1"),
        Message::user("u2"),
        Message::assistant("a2"),
        Message::user("u3"),
        Message::assistant("a3"),
    ]
}

fn contents(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.content.as_str()).collect()
}

fn exceeded() -> (TokenBudget, usize) {
    (TokenBudget::new(1000, 0.2).unwrap(), 850)
}

#[tokio::test]
async fn test_sliding_window_keeps_system_and_tail() {
    let (budget, current) = exceeded();
    let result = SlidingWindow::new(2)
        .truncate(conversation(), &budget, current)
        .await;
    assert_eq!(contents(&result), vec!["system", "u3", "a3"]);
}

#[tokio::test]
async fn test_healthy_buffer_is_untouched() {
    let budget = TokenBudget::new(1000, 0.2).unwrap();
    let mut compressor = MockCompressor::new();
    compressor.expect_compress().never();
    let compressor: Arc<dyn Compressor> = Arc::new(compressor);

    let strategies: Vec<Box<dyn TruncationStrategy>> = vec![
        Box::new(SlidingWindow::new(2)),
        Box::new(Summarization::new(2, compressor.clone())),
        Box::new(Symbolization::new(2, 2, compressor).unwrap()),
    ];
    for strategy in strategies {
        let result = strategy.truncate(conversation(), &budget, 750).await;
        assert_eq!(result, conversation(), "{} changed a healthy buffer", strategy.name());
    }
}

#[tokio::test]
async fn test_short_buffer_is_untouched() {
    let (budget, current) = exceeded();
    let short = vec![Message::system("s"), Message::user("u"), Message::assistant("a")];
    let result = SlidingWindow::new(2).truncate(short.clone(), &budget, current).await;
    assert_eq!(result, short);
}

#[tokio::test]
async fn test_interleaved_preserved_messages_keep_relative_order() {
    let (budget, current) = exceeded();
    let messages = vec![
        Message::user("u1"),
        Message::system("s1"),
        Message::assistant("a1"),
        Message::system("s2"),
        Message::user("u2"),
    ];
    let result = SlidingWindow::new(1).truncate(messages, &budget, current).await;
    assert_eq!(contents(&result), vec!["s1", "s2", "u2"]);
}

#[tokio::test]
async fn test_custom_preserve_rule() {
    let (budget, current) = exceeded();
    let pinned: PreservePredicate = Arc::new(|m: &Message| m.content.starts_with("pin:"));
    let messages = vec![
        Message::system("system"),
        Message::user("pin: remember me"),
        Message::user("u1"),
        Message::user("u2"),
    ];

    let result = SlidingWindow::new(1)
        .with_preserve(pinned)
        .truncate(messages, &budget, current)
        .await;
    // The system message is no longer protected under this rule
    assert_eq!(contents(&result), vec!["pin: remember me", "u2"]);
}

#[tokio::test]
async fn test_summarization_inserts_summary_after_preserved() {
    let (budget, current) = exceeded();
    let mut compressor = MockCompressor::new();
    compressor
        .expect_compress()
        .withf(|dropped| dropped.len() == 4 && dropped[0].content == "u1")
        .times(1)
        .returning(|_| Ok(Message::assistant("summary of u1..a2")));

    let strategy = Summarization::new(2, Arc::new(compressor));
    let result = strategy.truncate(conversation(), &budget, current).await;
    assert_eq!(
        contents(&result),
        vec!["system", "summary of u1..a2", "u3", "a3"]
    );
}

#[tokio::test]
async fn test_summarization_falls_back_to_placeholder() {
    let (budget, current) = exceeded();
    let mut compressor = MockCompressor::new();
    compressor
        .expect_compress()
        .times(1)
        .returning(|_| Err(Error::Compression("timeout".to_string())));

    let strategy = Summarization::new(2, Arc::new(compressor));
    let result = strategy.truncate(conversation(), &budget, current).await;

    assert_eq!(result.len(), 4);
    assert!(result[1].content.contains("4 earlier messages"));
    assert_eq!(result[1].name.as_deref(), Some("summary"));
    assert_eq!(contents(&result[2..]), vec!["u3", "a3"]);
}

#[tokio::test]
async fn test_symbolization_batches_dropped_messages() {
    let (budget, current) = exceeded();
    let mut compressor = MockCompressor::new();
    // 4 dropped messages in batches of 3: two calls
    compressor
        .expect_compress()
        .times(2)
        .returning(|batch| {
            let lines: Vec<String> = batch.iter().map(|m| format!("sym:{}", m.content)).collect();
            Ok(Message::assistant(lines.join("\n")))
        });

    let strategy = Symbolization::new(2, 3, Arc::new(compressor)).unwrap();
    let result = strategy.truncate(conversation(), &budget, current).await;

    assert_eq!(result.len(), 4);
    assert_eq!(result[1].content, "sym:u1\nsym:a1\nsym:u2\nsym:a2");
    assert_eq!(result[1].name.as_deref(), Some("symbols"));
}

#[tokio::test]
async fn test_symbolization_failed_batch_becomes_placeholder_line() {
    let (budget, current) = exceeded();
    let mut compressor = MockCompressor::new();
    let mut seq = mockall::Sequence::new();
    compressor
        .expect_compress()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(Error::Compression("rate limited".to_string())));
    compressor
        .expect_compress()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Message::assistant("u2: ask\na2: answer")));

    let strategy = Symbolization::new(2, 2, Arc::new(compressor)).unwrap();
    let result = strategy.truncate(conversation(), &budget, current).await;

    assert_eq!(
        result[1].content.lines().collect::<Vec<_>>(),
        vec!["[2 messages removed]", "u2: ask", "a2: answer"]
    );
}

#[tokio::test]
async fn test_symbolization_blank_batch_becomes_placeholder_line() {
    let (budget, current) = exceeded();
    let mut compressor = MockCompressor::new();
    let mut seq = mockall::Sequence::new();
    compressor
        .expect_compress()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Message::assistant("u1: hi")));
    compressor
        .expect_compress()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Message::assistant("  \n\n")));

    let strategy = Symbolization::new(2, 2, Arc::new(compressor)).unwrap();
    let result = strategy.truncate(conversation(), &budget, current).await;

    assert_eq!(
        result[1].content.lines().collect::<Vec<_>>(),
        vec!["u1: hi", "[2 messages removed]"]
    );
}

#[test]
fn test_symbolization_rejects_zero_batch() {
    let compressor: Arc<dyn Compressor> = Arc::new(MockCompressor::new());
    assert!(matches!(
        Symbolization::new(2, 0, compressor),
        Err(Error::Configuration(_))
    ));
}

#[tokio::test]
async fn test_output_length_is_bounded() {
    let (budget, current) = exceeded();
    let mut long = vec![Message::system("s")];
    for i in 0..40 {
        long.push(Message::user(format!("u{}", i)));
    }

    for keep in [0, 1, 5, 39, 40, 100] {
        let mut compressor = MockCompressor::new();
        compressor
            .expect_compress()
            .returning(|_| Ok(Message::assistant("summary")));
        let strategy = Summarization::new(keep, Arc::new(compressor));

        let result = strategy.truncate(long.clone(), &budget, current).await;
        assert!(result.len() <= 1 + keep + 1, "keep {} gave {}", keep, result.len());
        assert_eq!(result[0].content, "s");

        let window = SlidingWindow::new(keep).truncate(long.clone(), &budget, current).await;
        assert_eq!(window.len(), 1 + keep.min(40));
        if keep > 0 {
            assert_eq!(window.last(), long.last());
        }
    }
}

#[test]
fn test_symbolization_runs_outside_a_runtime() {
    let (budget, current) = exceeded();
    let mut compressor = MockCompressor::new();
    compressor
        .expect_compress()
        .times(3)
        .returning(|batch| Ok(Message::assistant(format!("{} messages", batch.len()))));
    let strategy = Symbolization::new(0, 2, Arc::new(compressor)).unwrap();

    let result = tokio_test::block_on(strategy.truncate(conversation(), &budget, current));
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].content, "system");
}
