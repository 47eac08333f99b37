use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::model::{Group, StudentId};

/// `POST groups/randomize`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomizeGroupsRequest {
    pub group_size: Option<i64>,
    pub student_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDto {
    pub id: u32,
    pub members: Vec<StudentId>,
}

impl From<&Group> for GroupDto {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            members: group.members.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomizeGroupsResponse {
    pub groups: Vec<GroupDto>,
}

/// `allocateReviews`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateReviewsRequest {
    pub reviews_per_submission: Option<i64>,
    pub student_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateReviewsResponse {
    pub reviews_per_submission: usize,
    pub reviews: BTreeMap<StudentId, Vec<StudentId>>,
}
