mod common;

use std::sync::Arc;

use chess_core::{Color, Outcome, PieceKind, Position};
use chess_server::protocol::ServerMessage;
use common::{error_text, is_snapshot, notification_text, sessions, TestClient};
use serde_json::json;

struct Table {
    sessions: chess_server::session::SessionHandler,
    match_id: u32,
    white: TestClient,
    black: TestClient,
    observer: TestClient,
}

/// alice as WHITE, bob as BLACK, carol watching; inboxes drained.
async fn seated_table() -> Table {
    let sessions = sessions();
    let match_id = sessions.registry().create("table");
    let mut white = TestClient::connect(&sessions, "alice");
    let mut black = TestClient::connect(&sessions, "bob");
    let mut observer = TestClient::connect(&sessions, "carol");

    white.join(&sessions, match_id, "WHITE").await;
    black.join(&sessions, match_id, "BLACK").await;
    observer.observe(&sessions, match_id).await;
    white.drain();
    black.drain();
    observer.drain();

    Table {
        sessions,
        match_id,
        white,
        black,
        observer,
    }
}

#[tokio::test]
async fn join_sends_snapshot_and_announces_to_others() {
    let sessions = sessions();
    let id = sessions.registry().create("lobby");
    let mut white = TestClient::connect(&sessions, "alice");
    let mut black = TestClient::connect(&sessions, "bob");

    white.join(&sessions, id, "WHITE").await;
    let got = white.drain();
    assert_eq!(got.len(), 1);
    match &got[0] {
        ServerMessage::StateSnapshot { snapshot } => {
            assert_eq!(snapshot.white.as_deref(), Some("alice"));
            assert_eq!(snapshot.game.board.len(), 64);
            assert_eq!(snapshot.game.turn, Color::White);
        }
        other => panic!("expected snapshot, got {other:?}"),
    }

    black.join(&sessions, id, "BLACK").await;
    assert!(is_snapshot(&black.drain()[0]));
    assert_eq!(
        white.drain(),
        vec![ServerMessage::notification("bob joined the match as BLACK")]
    );
}

#[tokio::test]
async fn legal_move_fans_out_to_everyone_but_the_mover() {
    let mut t = seated_table().await;

    t.white.play(&t.sessions, t.match_id, (2, 5), (4, 5)).await;

    let own = t.white.drain();
    assert_eq!(own.len(), 1);
    assert!(is_snapshot(&own[0]));

    for inbox in [t.black.drain(), t.observer.drain()] {
        assert_eq!(inbox.len(), 2);
        assert!(is_snapshot(&inbox[0]));
        assert_eq!(notification_text(&inbox[1]), Some("alice (WHITE) moved e2-e4"));
    }

    let snap = t.sessions.registry().snapshot(t.match_id).await.unwrap();
    assert_eq!(snap.game.turn, Color::Black);
    let e4 = Position::new(4, 5).unwrap().index();
    assert_eq!(snap.game.board[e4].map(|p| p.kind), Some(PieceKind::Pawn));
}

#[tokio::test]
async fn out_of_turn_move_is_private_and_changes_nothing() {
    let mut t = seated_table().await;
    let before = t.sessions.registry().snapshot(t.match_id).await.unwrap();

    t.black.play(&t.sessions, t.match_id, (7, 5), (5, 5)).await;

    let got = t.black.drain();
    assert_eq!(got.len(), 1);
    assert_eq!(error_text(&got[0]), Some("Error: wrong turn"));
    assert!(t.white.drain().is_empty());
    assert!(t.observer.drain().is_empty());
    assert_eq!(t.sessions.registry().snapshot(t.match_id).await.unwrap(), before);
}

#[tokio::test]
async fn illegal_move_is_reported_privately() {
    let mut t = seated_table().await;

    // Pawn cannot jump three squares.
    t.white.play(&t.sessions, t.match_id, (2, 5), (5, 5)).await;

    let got = t.white.drain();
    assert!(error_text(&got[0]).is_some_and(|m| m.starts_with("Error: invalid move")));
    assert!(t.black.drain().is_empty());
}

#[tokio::test]
async fn resignation_decides_the_match() {
    let mut t = seated_table().await;

    t.white
        .send(&t.sessions, json!({"type": "resign", "match_id": t.match_id}))
        .await;

    assert_eq!(
        t.white.drain(),
        vec![ServerMessage::notification("You have resigned. BLACK wins.")]
    );
    assert_eq!(
        t.black.drain(),
        vec![ServerMessage::notification(
            "alice (WHITE) has resigned. BLACK wins."
        )]
    );

    let snap = t.sessions.registry().snapshot(t.match_id).await.unwrap();
    assert_eq!(snap.game.outcome, Outcome::BlackWon);
    assert_eq!(snap.white, None);

    t.black.play(&t.sessions, t.match_id, (7, 5), (5, 5)).await;
    let got = t.black.drain();
    assert_eq!(error_text(&got[0]), Some("Error: match is already decided"));
    assert!(t.observer.drain().iter().all(|m| !is_snapshot(m)));
}

#[tokio::test]
async fn fools_mate_is_announced() {
    let mut t = seated_table().await;
    let id = t.match_id;

    t.white.play(&t.sessions, id, (2, 6), (3, 6)).await;
    t.black.play(&t.sessions, id, (7, 5), (5, 5)).await;
    t.white.play(&t.sessions, id, (2, 7), (4, 7)).await;
    t.white.drain();
    t.observer.drain();
    t.black.play(&t.sessions, id, (8, 4), (4, 8)).await;

    let got = t.white.drain();
    assert_eq!(got.len(), 2);
    assert_eq!(
        notification_text(&got[1]),
        Some("bob (BLACK) moved d8-h4. Checkmate, BLACK wins.")
    );
    match &got[0] {
        ServerMessage::StateSnapshot { snapshot } => {
            assert_eq!(snapshot.game.outcome, Outcome::BlackWon)
        }
        other => panic!("expected snapshot, got {other:?}"),
    }
}

#[tokio::test]
async fn reconnecting_player_keeps_the_seat() {
    let mut t = seated_table().await;
    t.sessions.disconnect(t.white.connection);

    let mut again = TestClient::connect(&t.sessions, "alice");
    again.join(&t.sessions, t.match_id, "WHITE").await;
    assert!(is_snapshot(&again.drain()[0]));
    assert_eq!(
        t.black.drain(),
        vec![ServerMessage::notification("alice joined the match as WHITE")]
    );

    again.play(&t.sessions, t.match_id, (2, 4), (4, 4)).await;
    assert_eq!(again.drain().len(), 1);
    assert_eq!(t.black.drain().len(), 2);
}

#[tokio::test]
async fn wire_format_of_a_snapshot() {
    let mut t = seated_table().await;
    t.white.play(&t.sessions, t.match_id, (2, 5), (4, 5)).await;

    let json: serde_json::Value =
        serde_json::from_str(&t.white.drain()[0].to_json().unwrap()).unwrap();
    assert_eq!(json["type"], "state_snapshot");
    assert_eq!(json["match"]["white"], "alice");
    assert_eq!(json["match"]["spectators"], json!(["carol"]));
    assert_eq!(json["match"]["game"]["turn"], "BLACK");
    assert_eq!(json["match"]["game"]["outcome"], "IN_PROGRESS");
    assert_eq!(
        json["match"]["game"]["board"][0],
        json!({"kind": "ROOK", "color": "WHITE"})
    );
}

#[tokio::test]
async fn observer_join_is_announced_to_the_players() {
    let mut t = seated_table().await;
    let mut dave = TestClient::connect(&t.sessions, "dave");

    dave.observe(&t.sessions, t.match_id).await;

    let own = dave.drain();
    assert_eq!(own.len(), 1);
    assert!(is_snapshot(&own[0]));
    let expected = vec![ServerMessage::notification("dave joined the match as an observer")];
    assert_eq!(t.white.drain(), expected);
    assert_eq!(t.black.drain(), expected);
    assert_eq!(t.observer.drain(), expected);
}

#[tokio::test]
async fn spectator_cannot_resign() {
    let mut t = seated_table().await;

    t.observer
        .send(&t.sessions, json!({"type": "resign", "match_id": t.match_id}))
        .await;

    let got = t.observer.drain();
    assert_eq!(got.len(), 1);
    assert_eq!(error_text(&got[0]), Some("Error: not a participant in this match"));
    assert!(t.white.drain().is_empty());
    assert!(t.black.drain().is_empty());

    let snap = t.sessions.registry().snapshot(t.match_id).await.unwrap();
    assert_eq!(snap.game.outcome, Outcome::InProgress);
    assert_eq!(snap.white.as_deref(), Some("alice"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn observer_joining_during_a_move_ends_on_the_current_board() {
    for _ in 0..200 {
        let Table {
            sessions,
            match_id,
            mut white,
            ..
        } = seated_table().await;
        let sessions = Arc::new(sessions);
        let mut dave = TestClient::connect(&sessions, "dave");

        let mover = {
            let sessions = sessions.clone();
            tokio::spawn(async move {
                white.play(&sessions, match_id, (2, 5), (4, 5)).await;
                white
            })
        };
        let watcher = {
            let sessions = sessions.clone();
            tokio::spawn(async move {
                dave.observe(&sessions, match_id).await;
                dave
            })
        };
        mover.await.unwrap();
        let mut dave = watcher.await.unwrap();

        let last_seen = dave
            .drain()
            .into_iter()
            .filter_map(|m| match m {
                ServerMessage::StateSnapshot { snapshot } => Some(snapshot.game),
                _ => None,
            })
            .last()
            .unwrap();
        let current = sessions.registry().snapshot(match_id).await.unwrap();
        assert_eq!(last_seen, current.game);
        assert_eq!(current.game.turn, Color::Black);
    }
}
