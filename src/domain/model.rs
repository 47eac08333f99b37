use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::utils::error::{EngineError, Result};

pub type StudentId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
}

impl Student {
    pub fn new(id: StudentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// 課程名單快照，保持輸入順序且不允許重複 id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new(students: Vec<Student>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(students.len());
        for student in &students {
            if !seen.insert(student.id) {
                return Err(EngineError::invalid_input(format!(
                    "student {} appears more than once in the roster",
                    student.id
                )));
            }
        }
        Ok(Self { students })
    }

    pub fn from_ids(ids: &[StudentId]) -> Result<Self> {
        Self::new(
            ids.iter()
                .map(|id| Student::new(*id, format!("Student {}", id)))
                .collect(),
        )
    }

    pub fn ids(&self) -> Vec<StudentId> {
        self.students.iter().map(|s| s.id).collect()
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn get(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: u32,
    pub members: Vec<StudentId>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: StudentId) -> bool {
        self.members.contains(&id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPolicy {
    #[serde(default = "default_allow_empty_groups")]
    pub allow_empty_groups: bool,
}

fn default_allow_empty_groups() -> bool {
    true
}

impl Default for GroupPolicy {
    fn default() -> Self {
        Self {
            allow_empty_groups: default_allow_empty_groups(),
        }
    }
}

/// 分組結果。隨機分組後各組人數差距不超過 1，手動調整後可能不再平衡
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub target_size: usize,
    pub groups: Vec<Group>,
    #[serde(default)]
    pub policy: GroupPolicy,
}

impl Grouping {
    pub fn group(&self, group_id: u32) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub fn group_of(&self, student: StudentId) -> Option<u32> {
        self.groups
            .iter()
            .find(|g| g.contains(student))
            .map(|g| g.id)
    }

    pub fn members(&self) -> Vec<StudentId> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter().copied())
            .collect()
    }

    pub fn student_count(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }
}

/// 評審位置：某位被評者的第幾個評審欄位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    pub reviewee: StudentId,
    pub slot: usize,
}

impl SlotRef {
    pub fn new(reviewee: StudentId, slot: usize) -> Self {
        Self { reviewee, slot }
    }
}

/// 被評者 -> 評審欄位。每位被評者固定有 `reviews_per_submission` 個欄位，
/// 移除學生或手動移動後欄位可能為空。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPairing {
    reviews_per_submission: usize,
    reviews: BTreeMap<StudentId, Vec<Option<StudentId>>>,
}

impl ReviewPairing {
    /// 不做檢查；讀回已儲存的配對後應呼叫 `validate`
    pub fn from_slots(
        reviews_per_submission: usize,
        reviews: BTreeMap<StudentId, Vec<Option<StudentId>>>,
    ) -> Self {
        Self {
            reviews_per_submission,
            reviews,
        }
    }

    pub fn reviews_per_submission(&self) -> usize {
        self.reviews_per_submission
    }

    pub fn slots(&self) -> &BTreeMap<StudentId, Vec<Option<StudentId>>> {
        &self.reviews
    }

    pub(crate) fn slots_mut(&mut self) -> &mut BTreeMap<StudentId, Vec<Option<StudentId>>> {
        &mut self.reviews
    }

    pub fn reviewees(&self) -> Vec<StudentId> {
        self.reviews.keys().copied().collect()
    }

    /// 該被評者目前已指派的評審
    pub fn reviewers_of(&self, reviewee: StudentId) -> Vec<StudentId> {
        self.reviews
            .get(&reviewee)
            .map(|slots| slots.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    pub fn reviewer_at(&self, slot: SlotRef) -> Option<StudentId> {
        self.reviews
            .get(&slot.reviewee)
            .and_then(|slots| slots.get(slot.slot))
            .copied()
            .flatten()
    }

    /// 該學生需要評審的作業擁有者
    pub fn assignments_for(&self, reviewer: StudentId) -> Vec<StudentId> {
        self.reviews
            .iter()
            .filter(|(_, slots)| slots.contains(&Some(reviewer)))
            .map(|(reviewee, _)| *reviewee)
            .collect()
    }

    pub fn reviewer_load(&self, reviewer: StudentId) -> usize {
        self.reviews
            .values()
            .flatten()
            .filter(|slot| **slot == Some(reviewer))
            .count()
    }

    pub fn reviewee_count(&self, reviewee: StudentId) -> usize {
        self.reviews
            .get(&reviewee)
            .map(|slots| slots.iter().flatten().count())
            .unwrap_or(0)
    }

    pub fn empty_slots(&self) -> Vec<SlotRef> {
        self.reviews
            .iter()
            .flat_map(|(reviewee, slots)| {
                slots
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.is_none())
                    .map(|(i, _)| SlotRef::new(*reviewee, i))
            })
            .collect()
    }

    /// 對外輸出的簡化形式：被評者 -> 評審清單
    pub fn to_map(&self) -> BTreeMap<StudentId, Vec<StudentId>> {
        self.reviews
            .keys()
            .map(|reviewee| (*reviewee, self.reviewers_of(*reviewee)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assignment {
    Groups(Grouping),
    Reviews(ReviewPairing),
}

/// 呼叫端保存的結果快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSnapshot {
    pub seed: Option<u64>,
    pub generated_at: DateTime<Utc>,
    pub assignment: Assignment,
}

impl AssignmentSnapshot {
    pub fn new(seed: Option<u64>, assignment: Assignment) -> Self {
        Self {
            seed,
            generated_at: Utc::now(),
            assignment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_rejects_duplicate_ids() {
        let result = Roster::new(vec![Student::new(1, "Ann"), Student::new(1, "Bo")]);
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn test_roster_keeps_input_order() {
        let roster = Roster::from_ids(&[3, 1, 2]).unwrap();
        assert_eq!(roster.ids(), vec![3, 1, 2]);
        assert_eq!(roster.get(1).unwrap().name, "Student 1");
    }

    #[test]
    fn test_pairing_degree_queries() {
        let mut reviews = BTreeMap::new();
        reviews.insert(1, vec![Some(2), Some(3)]);
        reviews.insert(2, vec![Some(3), None]);
        reviews.insert(3, vec![Some(1), Some(2)]);
        let pairing = ReviewPairing::from_slots(2, reviews);

        assert_eq!(pairing.reviewer_load(3), 2);
        assert_eq!(pairing.reviewee_count(2), 1);
        assert_eq!(pairing.assignments_for(2), vec![1, 3]);
        assert_eq!(pairing.empty_slots(), vec![SlotRef::new(2, 1)]);
        assert_eq!(pairing.reviewer_at(SlotRef::new(3, 0)), Some(1));
        assert_eq!(pairing.reviewer_at(SlotRef::new(2, 1)), None);
    }

    #[test]
    fn test_snapshot_serializes_assignment_kind() {
        let grouping = Grouping {
            target_size: 2,
            groups: vec![Group {
                id: 1,
                members: vec![1, 2],
            }],
            policy: GroupPolicy::default(),
        };
        let snapshot = AssignmentSnapshot::new(Some(7), Assignment::Groups(grouping.clone()));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["assignment"]["groups"]["target_size"], 2);

        let back: AssignmentSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back.assignment, Assignment::Groups(grouping));
    }
}
