// tests/dry_run.rs
//! End-to-end runs of the binary against the simulated platform.

mod common;
use common::{TestWarden, at, message, reply, sent_texts, text};
use serde_json::json;

#[test]
fn test_escalated_join_request_is_approved_by_reply() {
    let warden = TestWarden::new("").unwrap();
    let intents = warden
        .run(&[
            json!({"type": "join_request", "group_id": 10, "user_id": 42,
                   "comment": "hi there", "flag": "req-42"}),
            message(1, 3, "admin", vec![reply(1_000_000), text("/approve welcome")]),
        ])
        .unwrap();

    assert_eq!(intents[0]["action"], "send_message");
    assert_eq!(intents[0]["message_id"], 1_000_000);
    let notice = intents[0]["text"].as_str().unwrap();
    assert!(notice.starts_with("[Join request]"));
    assert!(notice.contains("Flag: req-42"));

    assert_eq!(
        intents[1],
        json!({"action": "resolve_join_request", "flag": "req-42",
               "approve": true, "reason": "welcome"})
    );
    assert_eq!(sent_texts(&intents).last().unwrap(), "Approved the join request from 42");
}

#[test]
fn test_member_command_is_denied_without_side_effects() {
    let warden = TestWarden::new("").unwrap();
    let intents = warden
        .run(&[
            message(1, 5, "member", vec![text("hello")]),
            message(2, 4, "member", vec![text("/kick "), at(5)]),
        ])
        .unwrap();

    assert_eq!(intents.len(), 1);
    assert_eq!(sent_texts(&intents), vec!["You don't have permission to do that"]);
}

#[test]
fn test_superuser_overrides_member_role() {
    let warden = TestWarden::new("").unwrap();
    let intents = warden
        .run(&[
            message(1, 5, "member", vec![text("hello")]),
            message(2, 900, "member", vec![text("/mute 30 "), at(5)]),
        ])
        .unwrap();

    assert_eq!(
        intents[0],
        json!({"action": "mute_member", "group_id": 10, "user_id": 5, "duration_secs": 30})
    );
    assert_eq!(sent_texts(&intents), vec!["Muted for 30 seconds"]);
}

#[test]
fn test_blacklist_survives_restart() {
    let warden = TestWarden::new("").unwrap();
    warden
        .run(&[json!({"type": "member_leave", "group_id": 10, "user_id": 7,
                      "operator_id": 7, "kind": "leave"})])
        .unwrap();
    assert!(warden.data_dir().join("warden.db").exists());

    let intents = warden
        .run(&[json!({"type": "join_request", "group_id": 20, "user_id": 7,
                      "comment": "", "flag": "back-again"})])
        .unwrap();
    assert_eq!(
        intents,
        vec![json!({"action": "resolve_join_request", "flag": "back-again",
                    "approve": false, "reason": "blacklisted"})]
    );
}

#[test]
fn test_forbidden_word_deletes_and_mutes() {
    let warden = TestWarden::new(
        "[forbidden]\ngroups = [10]\nwords = [\"scam\"]\nmute_secs = 300\n",
    )
    .unwrap();
    let intents = warden
        .run(&[message(1, 5, "member", vec![text("free SCAM links"), text(" and a scam")])])
        .unwrap();

    assert_eq!(
        intents,
        vec![
            json!({"action": "delete_message", "message_id": 1}),
            json!({"action": "mute_member", "group_id": 10, "user_id": 5, "duration_secs": 300}),
        ]
    );
}

#[test]
fn test_invalid_config_refuses_to_start() {
    let warden = TestWarden::new("[mute]\nrandom_min_secs = 50\nrandom_max_secs = 10\n").unwrap();
    assert!(warden.run(&[]).is_err());
}
