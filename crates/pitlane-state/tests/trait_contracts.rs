//! Trait contract tests for CircuitRecordStore and RaceLedger.
//!
//! Every backend must pass the same behavioural checks; the helpers below
//! are run against both the in-memory fakes and the JSON-file backends.

use std::sync::Arc;

use chrono::Utc;
use pitlane_state::fakes::{MemoryCircuitRecordStore, MemoryRaceLedger};
use pitlane_state::fs::{FsCircuitRecordStore, FsRaceLedger};
use pitlane_state::*;

fn quali(circuit: &str, time_ms: u32, athlete: &str, race_id: &str) -> RecordCandidate {
    RecordCandidate {
        circuit_id: circuit.to_string(),
        kind: RecordKind::Qualifying,
        time_ms,
        athlete: athlete.to_string(),
        race_id: race_id.to_string(),
    }
}

fn entry(discipline: &str, race_id: &str, round: u32) -> LedgerEntry {
    LedgerEntry {
        key: LedgerKey::new(discipline, race_id),
        round,
        payload: serde_json::json!({ "race": race_id }),
        recorded_at: Utc::now(),
    }
}

// ===========================================================================
// CircuitRecordStore contract
// ===========================================================================

async fn faster_lap_replaces_slower(store: &dyn CircuitRecordStore) {
    store
        .record_if_faster(&quali("monza", 89_000, "sainz", "2024-r16"))
        .await
        .unwrap();
    let outcome = store
        .record_if_faster(&quali("monza", 88_200, "leclerc", "2025-r16"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RecordOutcome::Improved {
            previous_ms: Some(89_000)
        }
    );
    let lap = store.get("monza").await.unwrap().unwrap().qualifying.unwrap();
    assert_eq!(lap.time_ms, 88_200);
    assert_eq!(lap.athlete, "leclerc");
}

async fn slower_lap_is_a_noop(store: &dyn CircuitRecordStore) {
    store
        .record_if_faster(&quali("monza", 88_200, "leclerc", "2025-r16"))
        .await
        .unwrap();
    let outcome = store
        .record_if_faster(&quali("monza", 88_500, "norris", "2025-r17"))
        .await
        .unwrap();

    assert_eq!(outcome, RecordOutcome::NotBeaten { stored_ms: 88_200 });
    let lap = store.get("monza").await.unwrap().unwrap().qualifying.unwrap();
    assert_eq!(lap.time_ms, 88_200);
}

async fn kinds_are_independent(store: &dyn CircuitRecordStore) {
    store
        .record_if_faster(&quali("spa", 100_000, "piastri", "r1"))
        .await
        .unwrap();
    let race = RecordCandidate {
        kind: RecordKind::Race,
        ..quali("spa", 104_000, "hamilton", "r1")
    };
    store.record_if_faster(&race).await.unwrap();

    let record = store.get("spa").await.unwrap().unwrap();
    assert_eq!(record.qualifying.unwrap().time_ms, 100_000);
    assert_eq!(record.race.unwrap().time_ms, 104_000);
}

async fn list_is_ordered(store: &dyn CircuitRecordStore) {
    for circuit in ["zandvoort", "bahrain", "monaco"] {
        store
            .record_if_faster(&quali(circuit, 70_000, "x", "r"))
            .await
            .unwrap();
    }
    let ids: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.circuit_id)
        .collect();
    assert_eq!(ids, vec!["bahrain", "monaco", "zandvoort"]);
}

#[tokio::test]
async fn memory_store_contract() {
    faster_lap_replaces_slower(&MemoryCircuitRecordStore::new()).await;
    slower_lap_is_a_noop(&MemoryCircuitRecordStore::new()).await;
    kinds_are_independent(&MemoryCircuitRecordStore::new()).await;
    list_is_ordered(&MemoryCircuitRecordStore::new()).await;
}

#[tokio::test]
async fn fs_store_contract() {
    let dir = tempfile::tempdir().unwrap();
    let fresh = |name: &str| FsCircuitRecordStore::new(dir.path().join(name));
    faster_lap_replaces_slower(&fresh("a.json")).await;
    slower_lap_is_a_noop(&fresh("b.json")).await;
    kinds_are_independent(&fresh("c.json")).await;
    list_is_ordered(&fresh("d.json")).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_never_regress_record() {
    let store = Arc::new(MemoryCircuitRecordStore::new());
    let times: Vec<u32> = (0..64).map(|i| 88_000 + (i * 37 % 500)).collect();
    let best = *times.iter().min().unwrap();

    let mut handles = Vec::new();
    for (i, time_ms) in times.into_iter().enumerate() {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .record_if_faster(&quali("monza", time_ms, "x", &format!("r{i}")))
                .await
                .unwrap()
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let lap = store.get("monza").await.unwrap().unwrap().qualifying.unwrap();
    assert_eq!(lap.time_ms, best);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fs_writers_never_regress_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsCircuitRecordStore::new(dir.path().join("records.json")));

    let mut handles = Vec::new();
    for (i, time_ms) in [90_500u32, 89_900, 90_100, 89_700, 90_000].into_iter().enumerate() {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .record_if_faster(&quali("imola", time_ms, "x", &format!("r{i}")))
                .await
                .unwrap()
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let lap = store.get("imola").await.unwrap().unwrap().qualifying.unwrap();
    assert_eq!(lap.time_ms, 89_700);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn separate_fs_instances_never_regress_record() {
    for round in 0..20 {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let mut handles = Vec::new();
        for t in 0..16u32 {
            let store = FsCircuitRecordStore::new(&path);
            handles.push(tokio::spawn(async move {
                let time_ms = 100_000 - 10 * t;
                let outcome = store
                    .record_if_faster(&quali("suzuka", time_ms, "x", &format!("r{t}")))
                    .await
                    .unwrap();
                (time_ms, outcome)
            }));
        }
        let mut improved = Vec::new();
        for h in handles {
            let (time_ms, outcome) = h.await.unwrap();
            if matches!(outcome, RecordOutcome::Improved { .. }) {
                improved.push(time_ms);
            }
        }

        let stored = FsCircuitRecordStore::new(&path)
            .get("suzuka")
            .await
            .unwrap()
            .unwrap()
            .qualifying
            .unwrap()
            .time_ms;
        assert_eq!(stored, 99_850, "round {round}");
        assert!(improved.contains(&99_850), "round {round}");
        assert!(improved.iter().all(|t| *t >= stored), "round {round}");
    }
}

// ===========================================================================
// RaceLedger contract
// ===========================================================================

async fn ledger_orders_by_round(ledger: &dyn RaceLedger) {
    ledger.put(entry("formula", "silverstone", 12)).await.unwrap();
    ledger.put(entry("formula", "bahrain", 1)).await.unwrap();
    ledger.put(entry("moto", "qatar", 1)).await.unwrap();

    let formula: Vec<String> = ledger
        .list(Some("formula"))
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.key.race_id)
        .collect();
    assert_eq!(formula, vec!["bahrain", "silverstone"]);

    let all = ledger.list(None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].key.race_id, "silverstone");
}

async fn ledger_get_missing_is_none(ledger: &dyn RaceLedger) {
    let missing = ledger
        .get(&LedgerKey::new("formula", "nowhere"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn memory_ledger_contract() {
    ledger_orders_by_round(&MemoryRaceLedger::new()).await;
    ledger_get_missing_is_none(&MemoryRaceLedger::new()).await;
}

#[tokio::test]
async fn fs_ledger_contract() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    ledger_orders_by_round(&FsRaceLedger::new(a.path()).unwrap()).await;
    ledger_get_missing_is_none(&FsRaceLedger::new(b.path()).unwrap()).await;
}
