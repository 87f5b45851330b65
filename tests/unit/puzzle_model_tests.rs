//! Unit tests for the puzzle record's JSON encoding.

use serde_json::json;

use chesscli_engine::models::puzzle::UNKNOWN_PLAYER;
use chesscli_engine::models::{Classification, Color, Puzzle};

fn sample() -> Puzzle {
    Puzzle {
        fen: "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3".into(),
        player_color: Color::White,
        solution_uci: "f1b5".into(),
        played_uci: "h2h3".into(),
        continuation: vec!["a7a6".into(), "b5a4".into()],
        eval_before: "+0.45".into(),
        eval_after: "-0.10".into(),
        source_label: "vs. opponent, 2024-03-01".into(),
        classification: Classification::Mistake,
        white_name: "alice".into(),
        black_name: "bob".into(),
        solve_count: 2,
    }
}

#[test]
fn record_survives_json_round_trip() {
    let puzzle = sample();
    let value = puzzle.to_json().expect("encode");
    assert_eq!(value["player_color"], "White");
    assert_eq!(value["classification"], "Mistake");
    assert_eq!(Puzzle::from_json(value).expect("decode"), puzzle);
}

#[test]
fn older_records_get_lenient_defaults() {
    let puzzle = Puzzle::from_json(json!({
        "fen": "8/8/8/8/8/8/8/K6k w - - 0 1",
        "solution_uci": "a1a2",
        "played_uci": "a1b1",
        "eval_before": "0.00",
        "eval_after": "0.00",
        "source_label": "old"
    }))
    .expect("decode");

    assert_eq!(puzzle.player_color, Color::Black);
    assert!(puzzle.continuation.is_empty());
    assert_eq!(puzzle.classification, Classification::Good);
    assert_eq!(puzzle.white_name, UNKNOWN_PLAYER);
    assert_eq!(puzzle.black_name, UNKNOWN_PLAYER);
    assert_eq!(puzzle.solve_count, 0);
}

#[test]
fn null_and_unknown_values_fall_back() {
    let mut value = sample().to_json().expect("encode");
    value["player_color"] = json!("Purple");
    value["continuation"] = json!(null);
    value["classification"] = json!("Brilliant");
    value["white_name"] = json!("");
    value["black_name"] = json!(null);
    value["solve_count"] = json!(null);

    let puzzle = Puzzle::from_json(value).expect("decode");
    assert_eq!(puzzle.player_color, Color::Black);
    assert!(puzzle.continuation.is_empty());
    assert_eq!(puzzle.classification, Classification::Good);
    assert_eq!(puzzle.white_name, "?");
    assert_eq!(puzzle.black_name, "?");
    assert_eq!(puzzle.solve_count, 0);
}

#[test]
fn wrongly_typed_fields_take_defaults() {
    let puzzle = Puzzle::from_json(json!({
        "fen": 42,
        "player_color": true,
        "played_uci": "a1b1",
        "continuation": ["e2e4", 7, "e7e5"],
        "eval_before": null,
        "classification": 3,
        "white_name": 9,
        "solve_count": "five"
    }))
    .expect("decode");

    assert_eq!(puzzle.fen, "");
    assert_eq!(puzzle.player_color, Color::Black);
    assert_eq!(puzzle.solution_uci, "", "missing text field is empty");
    assert_eq!(puzzle.played_uci, "a1b1");
    assert_eq!(puzzle.continuation, vec!["e2e4", "e7e5"]);
    assert_eq!(puzzle.eval_before, "");
    assert_eq!(puzzle.classification, Classification::Good);
    assert_eq!(puzzle.white_name, UNKNOWN_PLAYER);
    assert_eq!(puzzle.solve_count, 0);
}

#[test]
fn non_object_element_is_an_error() {
    assert!(Puzzle::from_json(json!(null)).is_err());
    assert!(Puzzle::from_json(json!("fen")).is_err());
}

#[test]
fn every_classification_has_a_stable_label() {
    for class in Classification::ALL {
        assert_eq!(Classification::from_label(class.as_str()), class);
        assert_eq!(class.to_string(), class.as_str());
    }
    assert_eq!(Classification::from_label("blunder"), Classification::Good);
}

#[test]
fn only_white_label_decodes_to_white() {
    assert_eq!(Color::from_label("White"), Color::White);
    assert_eq!(Color::from_label("Black"), Color::Black);
    assert_eq!(Color::from_label("white"), Color::Black);
}
