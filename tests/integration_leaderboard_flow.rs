use sweepbench::category::Category::{Hard, Neutral, Soft};
use sweepbench::leaderboard::LeaderboardClient;
use sweepbench::ranked_store::{RankedStore, SqliteRankedStore};
use sweepbench::session::SessionRecorder;
use sweepbench::store::{FileStatsStore, StatsStore};
use sweepbench::submit::{SubmitError, SubmitWorkflow};
use tempfile::tempdir;
use assert_matches::assert_matches;

// The full submit-and-browse flow against a real shared database file:
// play, submit through the workflow, and page the board with cursors.

#[test]
fn submitted_score_appears_on_the_refreshed_board() {
    let dir = tempdir().unwrap();
    let board_path = dir.path().join("leaderboard.db");
    let stats_store = FileStatsStore::with_path(dir.path().join("stats.json"));

    // Play one perfect three-question session.
    let mut session = SessionRecorder::new(3);
    session.record_answer(Neutral, Neutral);
    session.record_answer(Soft, Soft);
    session.record_answer(Hard, Hard);
    session.finalize(&stats_store).unwrap();

    let ranked = SqliteRankedStore::new(&board_path).unwrap();
    let mut client = LeaderboardClient::new(Box::new(ranked), 10);

    let mut workflow = SubmitWorkflow::new(3);
    let pending = workflow
        .request("sweep_spotter", &stats_store.load())
        .unwrap();
    assert_eq!(pending.accuracy, 100.0);

    let stored = workflow
        .confirm(client.store_mut(), &stats_store)
        .unwrap();
    assert_eq!(stored.username, "sweep_spotter");

    // Submission reset the slot, and the entry is visible after refresh.
    assert_eq!(stats_store.load().total_attempted, 0);
    client.refresh().unwrap();
    assert_eq!(client.total_entries(), 1);
    assert_eq!(client.entries()[0].username, "sweep_spotter");
    assert_eq!(client.entries()[0].matrix.get(Soft, Soft), 1);
}

#[test]
fn board_pages_walk_forward_and_back_without_drift() {
    let dir = tempdir().unwrap();
    let board_path = dir.path().join("leaderboard.db");

    // Seed 23 entries through the workflow, each from its own "user".
    let stats_store = FileStatsStore::with_path(dir.path().join("stats.json"));
    let ranked = SqliteRankedStore::new(&board_path).unwrap();
    let mut client = LeaderboardClient::new(Box::new(ranked), 5);
    let mut workflow = SubmitWorkflow::new(1);

    for i in 0..23u32 {
        let mut session = SessionRecorder::new(4);
        // Vary accuracy: i%5 of 4 answers correct.
        for k in 0..4 {
            if k < i % 5 {
                session.record_answer(Hard, Hard);
            } else {
                session.record_answer(Soft, Hard);
            }
        }
        session.finalize(&stats_store).unwrap();
        workflow
            .request(&format!("player_{i:02}"), &stats_store.load())
            .unwrap();
        workflow.confirm(client.store_mut(), &stats_store).unwrap();
    }

    client.refresh().unwrap();
    assert_eq!(client.total_entries(), 23);
    assert_eq!(client.total_pages(), 5);

    // Walk to the end: 4 full pages and a final partial one.
    let mut pages = vec![client.entries().to_vec()];
    while client.next_page().unwrap() {
        pages.push(client.entries().to_vec());
    }
    assert_eq!(pages.len(), 5);
    assert_eq!(pages.last().unwrap().len(), 3);

    // Ranking is monotonically non-increasing across the whole walk.
    let flat: Vec<f64> = pages
        .iter()
        .flatten()
        .map(|e| e.accuracy)
        .collect();
    assert_eq!(flat.len(), 23);
    assert!(flat.windows(2).all(|w| w[0] >= w[1]));

    // Walk back up; every page must match what we saw on the way down.
    for expected in pages.iter().rev().skip(1) {
        assert!(client.previous_page().unwrap());
        assert_eq!(client.entries(), expected.as_slice());
    }
    assert!(!client.previous_page().unwrap());
}

#[test]
fn validation_failures_never_touch_board_or_slot() {
    let dir = tempdir().unwrap();
    let stats_store = FileStatsStore::with_path(dir.path().join("stats.json"));

    let mut session = SessionRecorder::new(2);
    session.record_answer(Neutral, Soft);
    session.record_answer(Hard, Hard);
    session.finalize(&stats_store).unwrap();
    let before = stats_store.load();

    let ranked = SqliteRankedStore::new(dir.path().join("leaderboard.db")).unwrap();
    let mut client = LeaderboardClient::new(Box::new(ranked), 10);
    let mut workflow = SubmitWorkflow::new(3);

    // Too short a username.
    assert_matches!(
        workflow.request("ab", &before),
        Err(SubmitError::UsernameLength(2))
    );
    // Enough characters but not enough attempts.
    assert_matches!(
        workflow.request("legit_name", &before),
        Err(SubmitError::NotEnoughAttempts { attempted: 2, .. })
    );

    assert_eq!(stats_store.load(), before);
    assert_eq!(client.store_mut().count().unwrap(), 0);
}

#[test]
fn two_clients_share_one_board_file() {
    let dir = tempdir().unwrap();
    let board_path = dir.path().join("leaderboard.db");

    let mut writer = SqliteRankedStore::new(&board_path).unwrap();
    let stats_store = FileStatsStore::with_path(dir.path().join("stats.json"));
    let mut session = SessionRecorder::new(3);
    session.record_answer(Neutral, Neutral);
    session.record_answer(Soft, Hard);
    session.record_answer(Hard, Hard);
    session.finalize(&stats_store).unwrap();

    let mut workflow = SubmitWorkflow::new(3);
    workflow.request("first_tab", &stats_store.load()).unwrap();
    workflow.confirm(&mut writer, &stats_store).unwrap();

    // A separate connection (another "tab") sees the same board.
    let reader = SqliteRankedStore::new(&board_path).unwrap();
    let mut other = LeaderboardClient::new(Box::new(reader), 10);
    other.refresh().unwrap();
    assert_eq!(other.total_entries(), 1);
    assert_eq!(other.entries()[0].username, "first_tab");
}
