use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use crate::config::ForkConfig;
use crate::conversation::{Conversation, Message};
use crate::error::Error;
use crate::fork::{ForkOption, ForkRequest, ForkService, Forker, SequentialIds};
use crate::store::{ConversationStore, InMemoryConversationStore, StoreError};
use crate::test_utils::{
    FailingStore, RejectingMessagesStore, branching_fixture, level_fixture,
};
use crate::tree::MessageTree;

fn original() -> Conversation {
    let mut convo = Conversation::new("abc123").with_title("Original Title");
    convo.user = Some("owner".to_string());
    convo.endpoint = Some("openAI".to_string());
    convo
        .payload
        .insert("model".to_string(), json!("gpt-4o"));
    convo
}

fn seeded_store(messages: Vec<Message>) -> Arc<InMemoryConversationStore> {
    Arc::new(InMemoryConversationStore::new().with_conversation(original(), messages))
}

fn forker() -> Forker {
    Forker::default().with_id_generator(Arc::new(SequentialIds::new()))
}

fn service(store: Arc<InMemoryConversationStore>) -> ForkService {
    ForkService::new(store, forker())
}

#[tokio::test]
async fn test_fork_direct_path_and_save() {
    let store = seeded_store(branching_fixture());
    let request = ForkRequest::new("abc123", "8", "user1").with_option(ForkOption::DirectPath);

    let outcome = service(store.clone()).fork(&request).await.unwrap();

    let convo = &outcome.conversation;
    assert_eq!(convo.conversation_id, "1");
    assert_eq!(convo.title.as_deref(), Some("Original Title"));
    assert_eq!(convo.user.as_deref(), Some("user1"));
    assert_eq!(convo.endpoint.as_deref(), Some("openAI"));
    assert_eq!(convo.payload.get("model"), Some(&json!("gpt-4o")));
    assert!(convo.created_at().is_some());

    let texts: Vec<_> = outcome.messages.iter().filter_map(Message::text).collect();
    assert_eq!(
        texts,
        vec!["Root message 2", "Child of 1", "Child of 3", "Child of 7"]
    );

    let new_ids: Vec<&str> = outcome.messages.iter().map(Message::id).collect();
    assert_eq!(new_ids, vec!["2", "3", "4", "5"]);
    assert_eq!(outcome.messages[0].parent_message_id, None);
    assert_eq!(outcome.messages[3].parent_message_id.as_deref(), Some("4"));
    assert!(outcome.messages.iter().all(|m| {
        m.conversation_id.as_deref() == Some("1") && m.user.as_deref() == Some("user1")
    }));

    let saved = store.fetch_conversation("1").await.unwrap().unwrap();
    assert_eq!(&saved, convo);
    assert_eq!(store.fetch_messages("1").await.unwrap(), outcome.messages);

    // The original is untouched.
    assert_eq!(store.fetch_messages("abc123").await.unwrap().len(), 9);
}

#[tokio::test]
async fn test_fork_bumps_equal_timestamps() {
    let store = seeded_store(branching_fixture());
    let request = ForkRequest::new("abc123", "8", "user1");

    let outcome = service(store).preview(&request).await.unwrap();

    let parent_at = outcome.messages[2].created_at().unwrap();
    let child_at = outcome.messages[3].created_at().unwrap();
    assert_eq!(child_at, parent_at + Duration::milliseconds(1));
}

#[tokio::test]
async fn test_timestamps_untouched_when_disabled() {
    let store = seeded_store(branching_fixture());
    let config = ForkConfig {
        monotonic_timestamps: false,
        ..ForkConfig::default()
    };
    let service = ForkService::new(
        store,
        Forker::new(config).with_id_generator(Arc::new(SequentialIds::new())),
    );

    let outcome = service
        .preview(&ForkRequest::new("abc123", "8", "user1"))
        .await
        .unwrap();
    assert_eq!(
        outcome.messages[2].created_at(),
        outcome.messages[3].created_at()
    );
}

#[tokio::test]
async fn test_default_option_from_config() {
    let store = seeded_store(level_fixture());
    let config = ForkConfig {
        default_option: ForkOption::TargetLevel,
        ..ForkConfig::default()
    };
    let forker = Forker::new(config).with_id_generator(Arc::new(SequentialIds::new()));

    let outcome = forker
        .fork_conversation(store.as_ref(), &ForkRequest::new("abc123", "5", "user1"))
        .await
        .unwrap();
    let texts: Vec<_> = outcome.messages.iter().filter_map(Message::text).collect();
    assert_eq!(
        texts,
        vec!["Message 7", "Message 8", "Message 5", "Message 6", "Message 9"]
    );
}

#[tokio::test]
async fn test_preview_does_not_save() {
    let store = seeded_store(branching_fixture());
    let outcome = service(store.clone())
        .preview(&ForkRequest::new("abc123", "3", "user1"))
        .await
        .unwrap();

    assert!(
        store
            .fetch_conversation(&outcome.conversation.conversation_id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_missing_conversation() {
    let store = seeded_store(branching_fixture());
    let err = service(store)
        .fork(&ForkRequest::new("nope", "1", "user1"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ConversationNotFound { ref conversation_id } if conversation_id == "nope"));
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let store = FailingStore::new(original());
    let err = forker()
        .fork_conversation(&store, &ForkRequest::new("abc123", "1", "user1"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Store(StoreError::Database { .. })));
    assert!(err.to_string().contains("Failed to fetch messages"));
}

#[tokio::test]
async fn test_failed_message_save_leaves_no_conversation() {
    let store = Arc::new(RejectingMessagesStore::new(
        InMemoryConversationStore::new().with_conversation(original(), branching_fixture()),
    ));
    let service = ForkService::new(store.clone(), forker());

    let err = service
        .fork(&ForkRequest::new("abc123", "8", "user1"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Store(StoreError::Database { .. })));
    assert!(err.to_string().contains("Failed to save messages"));
    // "1" would have been the fork's conversation id.
    assert!(store.fetch_conversation("1").await.unwrap().is_none());
    assert!(store.fetch_conversation("abc123").await.unwrap().is_some());
}

#[tokio::test]
async fn test_missing_target_gives_empty_fork() {
    let store = seeded_store(branching_fixture());
    let outcome = service(store.clone())
        .fork(&ForkRequest::new("abc123", "123", "user1"))
        .await
        .unwrap();

    assert!(outcome.messages.is_empty());
    assert!(
        store
            .fetch_conversation(&outcome.conversation.conversation_id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_untitled_original_gets_default_title() {
    let store = Arc::new(InMemoryConversationStore::new().with_conversation(
        Conversation::new("untitled"),
        vec![Message::new("1", None)],
    ));
    let outcome = service(store)
        .preview(&ForkRequest::new("untitled", "1", "user1"))
        .await
        .unwrap();

    assert_eq!(outcome.conversation.title.as_deref(), Some("New Chat"));
}

#[tokio::test]
async fn test_split_requires_latest_message() {
    let store = seeded_store(level_fixture());
    let mut request = ForkRequest::new("abc123", "5", "user1");
    request.split_at_target = true;

    let err = service(store).fork(&request).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[tokio::test]
async fn test_split_then_select_from_latest() {
    let store = seeded_store(level_fixture());
    let request = ForkRequest::new("abc123", "5", "user1")
        .with_option(ForkOption::DirectPath)
        .split_at_target("10");

    let outcome = service(store).fork(&request).await.unwrap();

    let texts: Vec<_> = outcome.messages.iter().filter_map(Message::text).collect();
    assert_eq!(texts, vec!["Message 5", "Message 3", "Message 10"]);
    assert_eq!(outcome.messages[0].parent_message_id, None);
}

#[tokio::test]
async fn test_split_with_target_level_option() {
    let store = seeded_store(level_fixture());
    let request = ForkRequest::new("abc123", "5", "user1")
        .with_option(ForkOption::TargetLevel)
        .split_at_target("2");

    let outcome = service(store).preview(&request).await.unwrap();

    let texts: Vec<_> = outcome.messages.iter().filter_map(Message::text).collect();
    assert_eq!(
        texts,
        vec![
            "Message 5",
            "Message 6",
            "Message 9",
            "Message 2",
            "Message 3",
            "Message 1",
            "Message 4"
        ]
    );
}

#[tokio::test]
async fn test_fork_of_fork() {
    let store = seeded_store(branching_fixture());
    let service = service(store.clone());

    let first = service
        .fork(&ForkRequest::new("abc123", "8", "user1"))
        .await
        .unwrap();
    let new_root = first.messages[0].message_id.clone();

    let second = service
        .fork(&ForkRequest::new(
            first.conversation.conversation_id.clone(),
            new_root,
            "user2",
        ))
        .await
        .unwrap();

    assert_eq!(second.messages.len(), 1);
    assert_eq!(second.messages[0].text(), Some("Root message 2"));
    assert_eq!(second.conversation.user.as_deref(), Some("user2"));
    assert_eq!(second.conversation.title.as_deref(), Some("Original Title"));
}

#[tokio::test]
async fn test_include_branches_fork_is_a_tree() {
    let store = seeded_store(branching_fixture());
    let outcome = service(store)
        .fork(
            &ForkRequest::new("abc123", "8", "user1").with_option(ForkOption::IncludeBranches),
        )
        .await
        .unwrap();

    let tree = MessageTree::new(&outcome.messages);
    assert_eq!(tree.roots().len(), 1);
    assert_eq!(tree.len(), outcome.messages.len());
    assert_eq!(outcome.messages.len(), 6);
}

#[test]
fn test_request_json_shape() {
    let request: ForkRequest = serde_json::from_value(json!({
        "originalConversationId": "abc123",
        "targetMessageId": "8",
        "requestingUserId": "user1",
        "option": "includeBranches",
        "splitAtTarget": true,
        "latestMessageId": "9"
    }))
    .unwrap();

    assert_eq!(request.option, Some(ForkOption::IncludeBranches));
    assert!(request.split_at_target);
    assert_eq!(request.latest_message_id.as_deref(), Some("9"));

    let minimal: ForkRequest = serde_json::from_value(json!({
        "originalConversationId": "abc123",
        "targetMessageId": "8",
        "requestingUserId": "user1"
    }))
    .unwrap();
    assert_eq!(minimal, ForkRequest::new("abc123", "8", "user1"));
}

#[test]
fn test_unknown_option_falls_back_to_default() {
    let request: ForkRequest = serde_json::from_value(json!({
        "originalConversationId": "abc123",
        "targetMessageId": "8",
        "requestingUserId": "user1",
        "option": "EVERYTHING"
    }))
    .unwrap();
    assert_eq!(request.option, None);

    let messages = branching_fixture();
    let outcome = forker()
        .fork_messages(&original(), &messages, &request)
        .unwrap();
    assert_eq!(outcome.messages.len(), 4);
}
