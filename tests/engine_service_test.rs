use anyhow::Result;
use peer_engine::adapters::storage::{load_snapshot, save_snapshot};
use peer_engine::core::engine::respond;
use peer_engine::core::RosterSource;
use peer_engine::domain::model::{Assignment, AssignmentSnapshot};
use peer_engine::domain::requests::{AllocateReviewsRequest, RandomizeGroupsRequest};
use peer_engine::{AssignmentEngine, CsvRoster, EngineConfig, LocalStorage};
use std::sync::Arc;
use tempfile::TempDir;

fn engine() -> AssignmentEngine<EngineConfig> {
    AssignmentEngine::new(EngineConfig::default())
}

#[test]
fn test_groups_randomize_json_round() -> Result<()> {
    let request: RandomizeGroupsRequest =
        serde_json::from_str(r#"{"groupSize": 2, "studentIds": [1, 2, 3, 4], "seed": 5}"#)?;
    let (status, body) = respond(engine().randomize_groups(&request));

    assert_eq!(status, 200);
    let groups = body["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    for group in groups {
        assert_eq!(group["members"].as_array().unwrap().len(), 2);
    }
    Ok(())
}

#[test]
fn test_error_taxonomy_in_responses() -> Result<()> {
    let empty: RandomizeGroupsRequest =
        serde_json::from_str(r#"{"groupSize": 2, "studentIds": []}"#)?;
    let (status, body) = respond(engine().randomize_groups(&empty));
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid_input");

    let missing: AllocateReviewsRequest = serde_json::from_str(r#"{"studentIds": [1, 2, 3]}"#)?;
    let (status, _) = respond(engine().allocate_reviews(&missing));
    assert_eq!(status, 400);

    let negative: AllocateReviewsRequest =
        serde_json::from_str(r#"{"reviewsPerSubmission": -1, "studentIds": [1, 2, 3]}"#)?;
    let (status, _) = respond(engine().allocate_reviews(&negative));
    assert_eq!(status, 400);

    let too_many: AllocateReviewsRequest =
        serde_json::from_str(r#"{"reviewsPerSubmission": 3, "studentIds": [1, 2, 3]}"#)?;
    let (status, body) = respond(engine().allocate_reviews(&too_many));
    assert_eq!(status, 422);
    assert!(body["message"].as_str().unwrap().contains('3'));
    Ok(())
}

#[test]
fn test_seeded_requests_are_idempotent() {
    let request = AllocateReviewsRequest {
        reviews_per_submission: Some(3),
        student_ids: Some((1..=15).collect()),
        seed: Some(2024),
    };
    let engine = engine();
    let first = engine.allocate_reviews(&request).unwrap();
    let second = engine.allocate_reviews(&request).unwrap();
    assert_eq!(first, second);

    let reseeded = AllocateReviewsRequest {
        seed: Some(2025),
        ..request
    };
    assert_ne!(engine.allocate_reviews(&reseeded).unwrap(), first);
}

#[test]
fn test_unseeded_requests_are_fresh() {
    let request = RandomizeGroupsRequest {
        group_size: Some(5),
        student_ids: Some((1..=40).collect()),
        seed: None,
    };
    let engine = engine();
    let results: Vec<_> = (0..5)
        .map(|_| engine.randomize_groups(&request).unwrap())
        .collect();
    assert!(results.windows(2).any(|pair| pair[0] != pair[1]));
}

#[tokio::test]
async fn test_concurrent_requests_do_not_interfere() -> Result<()> {
    let engine = Arc::new(engine());
    let mut handles = Vec::new();
    for seed in 0..8u64 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let request = AllocateReviewsRequest {
                reviews_per_submission: Some(2),
                student_ids: Some((1..=10).collect()),
                seed: Some(seed),
            };
            engine.allocate_reviews(&request)
        }));
    }

    for (seed, handle) in handles.into_iter().enumerate() {
        let concurrent = handle.await??;
        let sequential = engine.allocate_reviews(&AllocateReviewsRequest {
            reviews_per_submission: Some(2),
            student_ids: Some((1..=10).collect()),
            seed: Some(seed as u64),
        })?;
        assert_eq!(concurrent, sequential);
    }
    Ok(())
}

#[tokio::test]
async fn test_csv_roster_to_saved_snapshot() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let roster_path = temp_dir.path().join("roster.csv");
    tokio::fs::write(&roster_path, "id,name\n1,Ann\n2,Bo\n3,Cy\n4,Di\n5,Ed\n").await?;

    let config_path = temp_dir.path().join("engine.toml");
    let output_dir = temp_dir.path().join("out");
    tokio::fs::write(
        &config_path,
        format!(
            "[engine]\ndefault_reviews_per_submission = 2\nseed = 11\n\n[output]\npath = \"{}\"\n",
            output_dir.to_str().unwrap().replace('\\', "/")
        ),
    )
    .await?;

    let config = EngineConfig::from_file(&config_path)?;
    let roster = CsvRoster::new(roster_path.to_str().unwrap())
        .load_roster()
        .await?;
    let storage = LocalStorage::new(config.output.path.clone());
    let engine = AssignmentEngine::new(config);

    let pairing = engine.allocate_roster(&roster.ids(), 2, None)?;
    let snapshot = AssignmentSnapshot::new(Some(11), Assignment::Reviews(pairing.clone()));
    save_snapshot(&storage, "reviews", &snapshot, false).await?;

    let loaded = load_snapshot(&storage, "reviews").await?;
    assert_eq!(loaded.assignment, Assignment::Reviews(pairing.clone()));

    // 設定檔中的 seed 讓結果可重現
    let again = engine.allocate_roster(&roster.ids(), 2, None)?;
    assert_eq!(again, pairing);
    Ok(())
}
