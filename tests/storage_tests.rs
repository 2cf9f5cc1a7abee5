//! File-backed store and share link tests

use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

use oppboard::share::{compare_link, data_param};
use oppboard::storage::{COLUMNS_KEY, OPPORTUNITIES_KEY};
use oppboard::{
    Board, JsonFileStore, KeyValueStore, OpportunityRepository, OppBoardError, SharePayload,
};

fn temp_store() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("temp dir"); // test: known-good input
    let path = dir.path().join("board.json");
    (dir, path)
}

#[test]
fn test_missing_file_opens_empty() {
    let (_dir, path) = temp_store();
    let store = JsonFileStore::open(&path).expect("open missing store"); // test: known-good input
    assert_eq!(store.get(OPPORTUNITIES_KEY).expect("read"), None); // test: known-good input
    assert!(!path.exists());
}

#[test]
fn test_writes_survive_reopen() {
    let (_dir, path) = temp_store();

    let mut board = Board::new();
    let id = board.create_opportunity(Some("Siding"));
    {
        let opp = board.opportunity_mut(&id).expect("just created"); // test: known-good input
        let a = opp.add_option("Vinyl");
        opp.set_price(a, dec!(12000)).expect("option exists"); // test: known-good input
        opp.add_option("Fiber cement");
    }
    board.move_opportunity(&id, "waiting").expect("valid move"); // test: known-good input

    let mut repo = OpportunityRepository::new(JsonFileStore::open(&path).expect("open")); // test: known-good input
    repo.save_board(&board).expect("save board"); // test: known-good input

    let reopened = OpportunityRepository::new(JsonFileStore::open(&path).expect("reopen")); // test: known-good input
    let loaded = reopened.load_board().expect("load board"); // test: known-good input
    assert_eq!(loaded, board);
}

#[test]
fn test_non_object_file_is_rejected() {
    let (_dir, path) = temp_store();
    fs::write(&path, "[1, 2, 3]").expect("write fixture"); // test: known-good input
    assert!(matches!(JsonFileStore::open(&path), Err(OppBoardError::Storage(_))));
}

#[test]
fn test_invalid_json_is_an_error() {
    let (_dir, path) = temp_store();
    fs::write(&path, "{ not json").expect("write fixture"); // test: known-good input
    assert!(matches!(JsonFileStore::open(&path), Err(OppBoardError::Json(_))));
}

#[test]
fn test_legacy_board_file() {
    let (_dir, path) = temp_store();
    fs::write(
        &path,
        r#"{
            "opportunities": [
                {
                    "id": "legacy-1",
                    "title": "Deck",
                    "options": [
                        { "id": 1, "content": "Cedar", "details": { "price": "4,500", "financeSettings": { "apr": "5.5", "termLength": "36" } } },
                        { "id": 2, "content": "Composite", "price": 7000 }
                    ],
                    "operators": [ { "id": 1, "type": "OR" } ],
                    "lastUpdated": "2025-03-01T12:00:00Z",
                    "column": "presented"
                },
                { "title": "no id" }
            ]
        }"#,
    )
    .expect("write fixture"); // test: known-good input

    let repo = OpportunityRepository::new(JsonFileStore::open(&path).expect("open")); // test: known-good input
    let all = repo.load_all().expect("load"); // test: known-good input
    assert_eq!(all.len(), 1);

    let deck = &all[0];
    assert_eq!(deck.options[0].price, dec!(4500));
    assert_eq!(
        deck.options[0].financing_option.map(|t| t.term_length),
        Some(36)
    );
    assert_eq!(deck.operators[0].kind, oppboard::OperatorKind::Or);
}

#[test]
fn test_compare_link_round_trip_through_store() {
    let (_dir, path) = temp_store();
    let mut board = Board::new();
    let id = board.create_opportunity(Some("Windows"));
    {
        let opp = board.opportunity_mut(&id).expect("just created"); // test: known-good input
        opp.add_option("Double pane");
        opp.add_option("Triple pane");
        let op = opp.operators[0].id;
        opp.set_operator(op, oppboard::OperatorKind::Or).expect("operator exists"); // test: known-good input
    }

    let opp = board.opportunity(&id).expect("just created"); // test: known-good input
    let link = compare_link("https://deals.example.com", opp).expect("link"); // test: known-good input
    let payload = SharePayload::decode(data_param(&link).expect("data")).expect("decode"); // test: known-good input
    assert_eq!(payload.options, opp.options);
    assert_eq!(payload.package_name(1), "Package 2");

    let mut repo = OpportunityRepository::new(JsonFileStore::open(&path).expect("open")); // test: known-good input
    repo.cache_show(&id, &payload).expect("cache"); // test: known-good input
    let reopened = OpportunityRepository::new(JsonFileStore::open(&path).expect("reopen")); // test: known-good input
    assert_eq!(reopened.cached_show(&id).expect("read"), Some(payload)); // test: known-good input
}

// =============================================================================
// Mistyped records
// =============================================================================

const MISTYPED_BOARD: &str = r#"{
    "opportunities": [
        {
            "id": "keep-me",
            "title": "Roof",
            "options": [
                { "id": 1, "content": 1234, "isComplete": "yes", "price": "$2,400.50", "isApproved": "no" },
                { "id": "2", "content": "Gutters", "price": [100], "promotion": "none", "financingOption": 12 }
            ],
            "operators": [ { "id": 1, "type": 7 } ],
            "lastUpdated": 1700000000000,
            "column": 3
        },
        { "id": "null-opts", "title": "Siding", "options": null, "operators": "and" },
        { "id": 99, "title": ["Deck"], "lastUpdated": "last tuesday", "financingOption": "6.99" },
        { "id": "b", "title": "Windows" },
        "garbage",
        { "title": "no id" }
    ]
}"#;

fn mistyped_store() -> (TempDir, std::path::PathBuf) {
    let (dir, path) = temp_store();
    fs::write(&path, MISTYPED_BOARD).expect("write fixture"); // test: known-good input
    (dir, path)
}

fn stored_records(path: &std::path::Path) -> Vec<Value> {
    let store = JsonFileStore::open(path).expect("reopen"); // test: known-good input
    let stored = store.get(OPPORTUNITIES_KEY).expect("read"); // test: known-good input
    match stored {
        Some(Value::Array(items)) => items,
        other => panic!("expected an array, got {:?}", other),
    }
}

#[test]
fn test_mistyped_fields_load_with_defaults() {
    let (_dir, path) = mistyped_store();
    let repo = OpportunityRepository::new(JsonFileStore::open(&path).expect("open")); // test: known-good input
    let all = repo.load_all().expect("load"); // test: known-good input
    let ids: Vec<&str> = all.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["keep-me", "null-opts", "99", "b"]);

    let roof = &all[0];
    assert_eq!(roof.options[0].content, "1234");
    assert!(roof.options[0].is_complete);
    assert_eq!(roof.options[0].price, dec!(2400.50));
    assert!(!roof.options[0].is_approved());
    assert_eq!(roof.options[1].id, 2);
    assert_eq!(roof.options[1].price, dec!(0));
    assert_eq!(roof.options[1].promotion, None);
    assert_eq!(roof.options[1].financing_option, None);
    assert_eq!(roof.operators[0].kind, oppboard::OperatorKind::And);
    assert_eq!(roof.last_updated.timestamp_millis(), 1_700_000_000_000);
    assert_eq!(roof.column, "3");

    assert!(all[1].options.is_empty());
    assert!(all[1].operators.is_empty());
    assert_eq!(all[2].title, "");
    assert_eq!(all[2].financing_option, None);
}

#[test]
fn test_upsert_keeps_every_stored_record() {
    let (_dir, path) = mistyped_store();
    let mut repo = OpportunityRepository::new(JsonFileStore::open(&path).expect("open")); // test: known-good input
    let mut windows = repo.get("b").expect("read").expect("stored"); // test: known-good input
    windows.title = "Windows and doors".to_string();
    repo.upsert(&windows).expect("upsert"); // test: known-good input

    let before: Value = serde_json::from_str(MISTYPED_BOARD).expect("fixture json"); // test: known-good input
    let after = stored_records(&path);
    assert_eq!(after.len(), 6);
    for i in [0, 1, 2, 4, 5] {
        assert_eq!(after[i], before["opportunities"][i]);
    }
    assert_eq!(after[3]["title"], json!("Windows and doors"));

    let reopened = OpportunityRepository::new(JsonFileStore::open(&path).expect("reopen")); // test: known-good input
    assert_eq!(reopened.load_all().expect("load").len(), 4); // test: known-good input
}

#[test]
fn test_delete_keeps_every_other_record() {
    let (_dir, path) = mistyped_store();
    let mut repo = OpportunityRepository::new(JsonFileStore::open(&path).expect("open")); // test: known-good input
    assert!(repo.delete("99").expect("delete")); // test: known-good input

    let after = stored_records(&path);
    assert_eq!(after.len(), 5);
    assert_eq!(after[0]["id"], json!("keep-me"));
    assert_eq!(after[1]["options"], Value::Null);
    assert_eq!(after[3], json!("garbage"));
}

#[test]
fn test_board_save_round_trip_keeps_unreadable_records() {
    let (_dir, path) = mistyped_store();
    let mut repo = OpportunityRepository::new(JsonFileStore::open(&path).expect("open")); // test: known-good input
    let board = repo.load_board().expect("load board"); // test: known-good input
    repo.save_board(&board).expect("save board"); // test: known-good input

    let after = stored_records(&path);
    assert_eq!(after.len(), 6);
    assert_eq!(after[4], json!("garbage"));
    assert_eq!(after[5], json!({ "title": "no id" }));
    assert_eq!(after[0]["options"][0]["isComplete"], json!(true));
    assert_eq!(after[0]["options"][0]["content"], json!("1234"));

    let reopened = OpportunityRepository::new(JsonFileStore::open(&path).expect("reopen")); // test: known-good input
    let reloaded = reopened.load_board().expect("reload board"); // test: known-good input
    assert_eq!(reloaded.opportunities, board.opportunities);
    assert!(reopened.store().get(COLUMNS_KEY).expect("read").is_some()); // test: known-good input
}
