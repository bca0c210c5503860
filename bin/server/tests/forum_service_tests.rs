//! End-to-end tests for the persistent forum service.
//!
//! Drives `PersistentForumState` directly, the same surface the HTTP
//! handlers call, against a temporary RocksDB instance.

use std::sync::{Arc, RwLock};
use tempfile::TempDir;
use verigeek::auth::{Role, User};
use verigeek::error::VeriGeekError;
use verigeek::forum::{Difficulty, ListParams, QuestionId};
use verigeek_server::persistence::PersistentForumState;

/// Opens a fresh forum over a temp directory.
fn fresh_forum() -> (TempDir, PersistentForumState) {
    let dir = TempDir::new().unwrap();
    let forum = PersistentForumState::with_data_dir(dir.path()).unwrap();
    (dir, forum)
}

/// Registers a member and returns the account.
fn member(forum: &mut PersistentForumState, name: &str) -> User {
    let email = format!("{}@example.com", name.to_lowercase());
    let (user, _token) = forum
        .register_user(name.to_string(), email, "hunter2!", Role::Member)
        .unwrap();
    user
}

#[test]
fn test_register_login_and_token_resolution() {
    let (_dir, mut forum) = fresh_forum();

    let (user, token) = forum
        .register_user(
            "Alice".to_string(),
            "Alice@Example.com".to_string(),
            "hunter2!",
            Role::Member,
        )
        .unwrap();
    assert_eq!(user.email, "alice@example.com");

    // The registration token is immediately usable.
    let resolved = forum.resolve_token(token.as_str()).unwrap();
    assert_eq!(resolved.id, user.id);

    // Login issues a fresh token; both remain valid.
    let (login_user, login_token) = forum.login("alice@example.com", "hunter2!").unwrap();
    assert_eq!(login_user.id, user.id);
    assert_ne!(login_token.as_str(), token.as_str());
    assert!(forum.resolve_token(login_token.as_str()).is_some());

    // Wrong password and unknown email fail identically.
    let wrong_pw = forum.login("alice@example.com", "wrong").unwrap_err();
    let no_user = forum.login("nobody@example.com", "hunter2!").unwrap_err();
    assert!(matches!(wrong_pw, VeriGeekError::Unauthorized(_)));
    assert_eq!(wrong_pw.to_string(), no_user.to_string());

    // Garbage tokens resolve to nothing.
    assert!(forum.resolve_token("not-a-token").is_none());
}

#[test]
fn test_duplicate_email_rejected() {
    let (_dir, mut forum) = fresh_forum();
    member(&mut forum, "Alice");

    let err = forum
        .register_user(
            "Other Alice".to_string(),
            "ALICE@example.com".to_string(),
            "different",
            Role::Member,
        )
        .unwrap_err();
    assert!(matches!(err, VeriGeekError::Validation(_)));
}

#[test]
fn test_create_question_validation() {
    let (_dir, mut forum) = fresh_forum();
    let alice = member(&mut forum, "Alice");

    let err = forum
        .create_question(
            "   ".to_string(),
            "Content".to_string(),
            vec![],
            None,
            alice.id,
        )
        .unwrap_err();
    assert!(matches!(err, VeriGeekError::Validation(_)));

    let q = forum
        .create_question(
            "Mux design help".to_string(),
            "How do I build a 4:1 mux?".to_string(),
            vec!["mux".to_string()],
            Some("assign y = sel ? a : b;".to_string()),
            alice.id,
        )
        .unwrap();
    assert_eq!(forum.get_question(&q.id).unwrap().title, "Mux design help");
}

#[test]
fn test_mutations_on_missing_question_are_not_found() {
    let (_dir, mut forum) = fresh_forum();
    let alice = member(&mut forum, "Alice");
    let ghost = QuestionId::from_hex("000000000000000000000000").unwrap();

    let err = forum
        .add_comment(&ghost, "hello?".to_string(), None, alice.id)
        .unwrap_err();
    assert!(matches!(err, VeriGeekError::NotFound(_)));

    assert!(matches!(
        forum.toggle_like(&ghost, alice.id).unwrap_err(),
        VeriGeekError::NotFound(_)
    ));
    assert!(matches!(
        forum.record_view(&ghost).unwrap_err(),
        VeriGeekError::NotFound(_)
    ));
    assert!(matches!(
        forum.delete_question(&ghost, &alice).unwrap_err(),
        VeriGeekError::NotFound(_)
    ));
}

#[test]
fn test_views_count_every_fetch() {
    let (_dir, mut forum) = fresh_forum();
    let alice = member(&mut forum, "Alice");
    let q = forum
        .create_question(
            "Popular".to_string(),
            "Content".to_string(),
            vec![],
            None,
            alice.id,
        )
        .unwrap();

    for _ in 0..5 {
        forum.record_view(&q.id).unwrap();
    }
    assert_eq!(forum.get_question(&q.id).unwrap().views, 5);
}

#[test]
fn test_likes_from_two_users_both_persist() {
    let (_dir, mut forum) = fresh_forum();
    let alice = member(&mut forum, "Alice");
    let bob = member(&mut forum, "Bob");
    let q = forum
        .create_question(
            "Likeable".to_string(),
            "Content".to_string(),
            vec![],
            None,
            alice.id,
        )
        .unwrap();

    let (_, liked) = forum.toggle_like(&q.id, alice.id).unwrap();
    assert!(liked);
    let (after_bob, liked) = forum.toggle_like(&q.id, bob.id).unwrap();
    assert!(liked);
    assert_eq!(after_bob.like_count(), 2);

    // Bob un-likes; Alice's like survives.
    let (after_untoggle, liked) = forum.toggle_like(&q.id, bob.id).unwrap();
    assert!(!liked);
    assert_eq!(after_untoggle.like_count(), 1);
    assert!(after_untoggle.likes.contains(&alice.id));
}

#[test]
fn test_comment_append_preserves_order() {
    let (_dir, mut forum) = fresh_forum();
    let alice = member(&mut forum, "Alice");
    let bob = member(&mut forum, "Bob");
    let q = forum
        .create_question(
            "Discussion".to_string(),
            "Content".to_string(),
            vec![],
            None,
            alice.id,
        )
        .unwrap();

    forum
        .add_comment(&q.id, "first".to_string(), None, bob.id)
        .unwrap();
    let updated = forum
        .add_comment(
            &q.id,
            "second".to_string(),
            Some("always @(posedge clk)".to_string()),
            alice.id,
        )
        .unwrap();

    assert_eq!(updated.comments.len(), 2);
    assert_eq!(updated.comments[0].content, "first");
    assert_eq!(updated.comments[1].content, "second");
    assert!(!updated.is_unanswered());
}

#[test]
fn test_set_difficulty() {
    let (_dir, mut forum) = fresh_forum();
    let alice = member(&mut forum, "Alice");
    let q = forum
        .create_question(
            "Hard one".to_string(),
            "Content".to_string(),
            vec![],
            None,
            alice.id,
        )
        .unwrap();
    assert!(q.difficulty.is_none());

    let updated = forum.set_difficulty(&q.id, Difficulty::Advanced).unwrap();
    assert_eq!(updated.difficulty, Some(Difficulty::Advanced));

    let updated = forum
        .set_difficulty(&q.id, Difficulty::Beginner)
        .unwrap();
    assert_eq!(updated.difficulty, Some(Difficulty::Beginner));
}

#[test]
fn test_delete_requires_author_or_admin() {
    let (_dir, mut forum) = fresh_forum();
    let alice = member(&mut forum, "Alice");
    let bob = member(&mut forum, "Bob");
    let (admin, _) = forum
        .register_user(
            "Root".to_string(),
            "root@example.com".to_string(),
            "hunter2!",
            Role::Admin,
        )
        .unwrap();

    let q1 = forum
        .create_question(
            "Alice's question".to_string(),
            "Content".to_string(),
            vec![],
            None,
            alice.id,
        )
        .unwrap();
    let q2 = forum
        .create_question(
            "Another one".to_string(),
            "Content".to_string(),
            vec![],
            None,
            alice.id,
        )
        .unwrap();

    // A bystander cannot delete, and the question stays retrievable.
    let err = forum.delete_question(&q1.id, &bob).unwrap_err();
    assert!(matches!(err, VeriGeekError::Forbidden(_)));
    assert!(forum.get_question(&q1.id).is_some());

    // The author can.
    forum.delete_question(&q1.id, &alice).unwrap();
    assert!(forum.get_question(&q1.id).is_none());

    // An admin can delete anyone's question.
    forum.delete_question(&q2.id, &admin).unwrap();
    assert!(forum.get_question(&q2.id).is_none());
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let question_id;
    let alice_id;

    {
        let mut forum = PersistentForumState::with_data_dir(dir.path()).unwrap();
        let alice = member(&mut forum, "Alice");
        alice_id = alice.id;
        let q = forum
            .create_question(
                "Durable".to_string(),
                "Content".to_string(),
                vec!["persistence".to_string()],
                None,
                alice.id,
            )
            .unwrap();
        question_id = q.id;

        forum.toggle_like(&q.id, alice.id).unwrap();
        forum
            .add_comment(&q.id, "still here".to_string(), None, alice.id)
            .unwrap();
        forum.set_difficulty(&q.id, Difficulty::Intermediate).unwrap();
        forum.record_view(&q.id).unwrap();
    }

    let forum = PersistentForumState::with_data_dir(dir.path()).unwrap();
    let q = forum.get_question(&question_id).unwrap();
    assert_eq!(q.title, "Durable");
    assert_eq!(q.comments.len(), 1);
    assert_eq!(q.like_count(), 1);
    assert_eq!(q.difficulty, Some(Difficulty::Intermediate));
    assert_eq!(q.views, 1);

    // The account survives too; sessions do not.
    assert_eq!(forum.state.get_user(&alice_id).unwrap().name, "Alice");
    assert_eq!(forum.state.user_count(), 1);
}

#[test]
fn test_listing_through_state() {
    let (_dir, mut forum) = fresh_forum();
    let alice = member(&mut forum, "Alice");

    for i in 0..15 {
        forum
            .create_question(
                format!("Question {}", i),
                "Content".to_string(),
                vec![],
                None,
                alice.id,
            )
            .unwrap();
    }

    let page = forum.list_questions(&ListParams {
        page: 2,
        limit: 10,
        ..Default::default()
    });
    assert_eq!(page.questions.len(), 5);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.current_page, 2);
}

#[test]
fn test_concurrent_toggles_serialize_under_write_lock() {
    let (_dir, mut forum) = fresh_forum();
    let alice = member(&mut forum, "Alice");
    let bob = member(&mut forum, "Bob");
    let q = forum
        .create_question(
            "Contended".to_string(),
            "Content".to_string(),
            vec![],
            None,
            alice.id,
        )
        .unwrap();
    let question_id = q.id;

    let shared = Arc::new(RwLock::new(forum));
    let mut handles = Vec::new();
    for user_id in [alice.id, bob.id] {
        let shared = Arc::clone(&shared);
        handles.push(std::thread::spawn(move || {
            let mut forum = shared.write().unwrap();
            forum.toggle_like(&question_id, user_id).unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let forum = shared.read().unwrap();
    let q = forum.get_question(&question_id).unwrap();
    assert_eq!(q.like_count(), 2);
    assert!(q.likes.contains(&alice.id));
    assert!(q.likes.contains(&bob.id));
}
