use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::core::{allocator, partitioner, ConfigProvider};
use crate::domain::model::{Grouping, ReviewPairing, StudentId};
use crate::domain::requests::{
    AllocateReviewsRequest, AllocateReviewsResponse, GroupDto, RandomizeGroupsRequest,
    RandomizeGroupsResponse,
};
use crate::utils::error::{EngineError, Result};
use crate::utils::validation::{positive_count, student_ids, Validate};

/// 分組與互評配對的對外入口。本身不保存狀態，可在多個 task 間共用。
pub struct AssignmentEngine<C: ConfigProvider> {
    config: C,
}

impl<C: ConfigProvider> AssignmentEngine<C> {
    pub fn new(config: C) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// 指定 seed 時結果可重現，否則每次重新取亂數
    fn rng_for(&self, seed: Option<u64>) -> StdRng {
        match seed.or_else(|| self.config.seed()) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn randomize_groups(
        &self,
        request: &RandomizeGroupsRequest,
    ) -> Result<RandomizeGroupsResponse> {
        let group_size = match request.group_size {
            None => self.config.default_group_size().ok_or_else(|| {
                EngineError::invalid_input("missing required field 'groupSize'")
            })?,
            size => positive_count("groupSize", size)?,
        };
        let ids = student_ids("studentIds", request.student_ids.as_deref())?;

        let grouping = self.partition_roster(&ids, group_size, request.seed)?;
        Ok(RandomizeGroupsResponse {
            groups: grouping.groups.iter().map(GroupDto::from).collect(),
        })
    }

    pub fn allocate_reviews(
        &self,
        request: &AllocateReviewsRequest,
    ) -> Result<AllocateReviewsResponse> {
        let per_submission = match request.reviews_per_submission {
            None => self.config.default_reviews_per_submission().ok_or_else(|| {
                EngineError::invalid_input("missing required field 'reviewsPerSubmission'")
            })?,
            count => positive_count("reviewsPerSubmission", count)?,
        };
        let ids = student_ids("studentIds", request.student_ids.as_deref())?;

        let pairing = self.allocate_roster(&ids, per_submission, request.seed)?;
        Ok(AllocateReviewsResponse {
            reviews_per_submission: pairing.reviews_per_submission(),
            reviews: pairing.to_map(),
        })
    }

    pub fn partition_roster(
        &self,
        ids: &[StudentId],
        group_size: usize,
        seed: Option<u64>,
    ) -> Result<Grouping> {
        tracing::info!(
            "Randomizing {} students into groups of {}",
            ids.len(),
            group_size
        );
        let mut rng = self.rng_for(seed);
        let grouping =
            partitioner::partition_with_policy(ids, group_size, self.config.group_policy(), &mut rng)?;
        check_grouping(&grouping, ids.len())?;
        tracing::info!("Created {} groups", grouping.groups.len());
        Ok(grouping)
    }

    pub fn allocate_roster(
        &self,
        ids: &[StudentId],
        reviews_per_submission: usize,
        seed: Option<u64>,
    ) -> Result<ReviewPairing> {
        tracing::info!(
            "Allocating {} reviewers per submission for {} students",
            reviews_per_submission,
            ids.len()
        );
        let mut rng = self.rng_for(seed);
        let pairing = allocator::allocate(ids, reviews_per_submission, &mut rng)?;
        check_pairing(&pairing)?;
        Ok(pairing)
    }

    pub fn rerandomize_groups(&self, grouping: &Grouping, seed: Option<u64>) -> Result<Grouping> {
        let mut rng = self.rng_for(seed);
        let fresh = grouping.rerandomize(&mut rng)?;
        check_grouping(&fresh, grouping.student_count())?;
        tracing::info!("Re-randomized {} groups", fresh.groups.len());
        Ok(fresh)
    }

    pub fn rerandomize_reviews(
        &self,
        pairing: &ReviewPairing,
        seed: Option<u64>,
    ) -> Result<ReviewPairing> {
        let mut rng = self.rng_for(seed);
        let fresh = pairing.rerandomize(&mut rng)?;
        check_pairing(&fresh)?;
        tracing::info!("Re-randomized review assignment");
        Ok(fresh)
    }
}

/// 將結果轉成 (狀態碼, JSON)，錯誤時不回傳任何部分結果
pub fn respond<T: Serialize>(result: Result<T>) -> (u16, serde_json::Value) {
    let outcome = result.and_then(|value| serde_json::to_value(value).map_err(EngineError::from));
    match outcome {
        Ok(body) => (200, body),
        Err(e) => {
            if e.status_code() >= 500 {
                tracing::error!("Assignment request failed: {}", e);
            } else {
                tracing::warn!("Assignment request rejected: {}", e);
            }
            let response = e.to_response();
            let status = response.status;
            let body = serde_json::to_value(&response).unwrap_or_else(|_| {
                serde_json::json!({ "status": status, "error": "internal_error" })
            });
            (status, body)
        }
    }
}

fn check_grouping(grouping: &Grouping, expected_students: usize) -> Result<()> {
    grouping
        .validate()
        .map_err(|e| EngineError::internal(format!("computed grouping is invalid: {}", e)))?;
    if !grouping.is_balanced() || grouping.student_count() != expected_students {
        return Err(EngineError::internal(
            "computed grouping lost students or is unbalanced",
        ));
    }
    Ok(())
}

fn check_pairing(pairing: &ReviewPairing) -> Result<()> {
    pairing
        .validate()
        .map_err(|e| EngineError::internal(format!("computed pairing is invalid: {}", e)))?;
    if !pairing.is_complete() {
        return Err(EngineError::internal(
            "computed pairing has unfilled slots or uneven load",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::EngineConfig;
    use std::collections::BTreeSet;

    fn engine() -> AssignmentEngine<EngineConfig> {
        AssignmentEngine::new(EngineConfig::default())
    }

    #[test]
    fn test_randomize_groups_scenario() {
        let request = RandomizeGroupsRequest {
            group_size: Some(2),
            student_ids: Some(vec![1, 2, 3, 4]),
            seed: Some(1),
        };
        let response = engine().randomize_groups(&request).unwrap();

        assert_eq!(response.groups.len(), 2);
        assert_eq!(response.groups[0].id, 1);
        let all: BTreeSet<_> = response
            .groups
            .iter()
            .flat_map(|g| g.members.iter().copied())
            .collect();
        assert_eq!(all, BTreeSet::from([1, 2, 3, 4]));
    }

    #[test]
    fn test_missing_fields_are_invalid_input() {
        let err = engine()
            .randomize_groups(&RandomizeGroupsRequest::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));

        let err = engine()
            .allocate_reviews(&AllocateReviewsRequest {
                reviews_per_submission: Some(1),
                student_ids: None,
                seed: None,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_config_default_group_size_is_used() {
        let mut config = EngineConfig::default();
        config.engine.default_group_size = Some(3);
        let engine = AssignmentEngine::new(config);

        let response = engine
            .randomize_groups(&RandomizeGroupsRequest {
                group_size: None,
                student_ids: Some((1..=9).collect()),
                seed: Some(2),
            })
            .unwrap();
        assert_eq!(response.groups.len(), 3);
    }

    #[test]
    fn test_respond_maps_errors_to_status() {
        let request = RandomizeGroupsRequest {
            group_size: Some(5),
            student_ids: Some(vec![1, 2]),
            seed: None,
        };
        let (status, body) = respond(engine().randomize_groups(&request));
        assert_eq!(status, 422);
        assert_eq!(body["error"], "size_exceeds_roster");

        let (status, body) = respond(engine().allocate_reviews(&AllocateReviewsRequest {
            reviews_per_submission: Some(2),
            student_ids: Some(vec![1, 2, 3, 4, 5]),
            seed: Some(9),
        }));
        assert_eq!(status, 200);
        assert_eq!(body["reviewsPerSubmission"], 2);
        assert_eq!(body["reviews"].as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_rerandomize_with_same_seed_is_reproducible() {
        let engine = engine();
        let ids: Vec<StudentId> = (1..=12).collect();
        let pairing = engine.allocate_roster(&ids, 3, Some(1)).unwrap();

        let a = engine.rerandomize_reviews(&pairing, Some(77)).unwrap();
        let b = engine.rerandomize_reviews(&pairing, Some(77)).unwrap();
        let c = engine.rerandomize_reviews(&pairing, Some(78)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
