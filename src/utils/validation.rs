use crate::domain::model::{Grouping, ReviewPairing, StudentId};
use crate::utils::error::{EngineError, Result};
use std::collections::{HashMap, HashSet};

pub trait Validate {
    fn validate(&self) -> Result<()>;

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EngineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EngineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(EngineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EngineError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 名單不可為空且 id 不可重複
pub fn validate_roster(student_ids: &[StudentId]) -> Result<()> {
    if student_ids.is_empty() {
        return Err(EngineError::invalid_input("roster must not be empty"));
    }

    let mut seen = HashSet::with_capacity(student_ids.len());
    for id in student_ids {
        if !seen.insert(*id) {
            return Err(EngineError::invalid_input(format!(
                "student {} appears more than once in the roster",
                id
            )));
        }
    }
    Ok(())
}

/// 將外部傳入的整數轉成正的 usize
pub fn positive_count(field_name: &str, value: Option<i64>) -> Result<usize> {
    let value = value.ok_or_else(|| {
        EngineError::invalid_input(format!("missing required field '{}'", field_name))
    })?;
    if value <= 0 {
        return Err(EngineError::invalid_input(format!(
            "'{}' must be a positive integer, got {}",
            field_name, value
        )));
    }
    usize::try_from(value).map_err(|_| {
        EngineError::invalid_input(format!("'{}' is too large: {}", field_name, value))
    })
}

pub fn student_ids(field_name: &str, value: Option<&[i64]>) -> Result<Vec<StudentId>> {
    let value = value.ok_or_else(|| {
        EngineError::invalid_input(format!("missing required field '{}'", field_name))
    })?;
    value
        .iter()
        .map(|id| {
            StudentId::try_from(*id).map_err(|_| {
                EngineError::invalid_input(format!("'{}' contains invalid id {}", field_name, id))
            })
        })
        .collect()
}

impl Validate for Grouping {
    fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            return Err(EngineError::invariant("target group size must be positive"));
        }

        let mut seen = HashSet::new();
        for (index, group) in self.groups.iter().enumerate() {
            if group.id as usize != index + 1 {
                return Err(EngineError::invariant(format!(
                    "group numbers must be sequential: expected {}, found {}",
                    index + 1,
                    group.id
                )));
            }

            if group.is_empty() && !self.policy.allow_empty_groups {
                return Err(EngineError::invariant(format!(
                    "group {} is empty and empty groups are not allowed",
                    group.id
                )));
            }

            for member in &group.members {
                if !seen.insert(*member) {
                    return Err(EngineError::invariant(format!(
                        "student {} belongs to more than one group",
                        member
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Grouping {
    /// 各組人數差距是否不超過 1
    pub fn is_balanced(&self) -> bool {
        let sizes = self.groups.iter().map(|g| g.len());
        match (sizes.clone().min(), sizes.max()) {
            (Some(min), Some(max)) => max - min <= 1,
            _ => true,
        }
    }
}

impl Validate for ReviewPairing {
    fn validate(&self) -> Result<()> {
        let per_submission = self.reviews_per_submission();
        if per_submission == 0 {
            return Err(EngineError::invariant(
                "reviews per submission must be positive",
            ));
        }

        let roster: HashSet<StudentId> = self.slots().keys().copied().collect();
        let mut load: HashMap<StudentId, usize> = HashMap::new();

        for (reviewee, slots) in self.slots() {
            if slots.len() != per_submission {
                return Err(EngineError::invariant(format!(
                    "student {} has {} reviewer slots, expected {}",
                    reviewee,
                    slots.len(),
                    per_submission
                )));
            }

            let mut in_set = HashSet::new();
            for reviewer in slots.iter().flatten() {
                if reviewer == reviewee {
                    return Err(EngineError::invariant(format!(
                        "student {} cannot review their own submission",
                        reviewee
                    )));
                }
                if !roster.contains(reviewer) {
                    return Err(EngineError::invariant(format!(
                        "reviewer {} is not on the roster",
                        reviewer
                    )));
                }
                if !in_set.insert(*reviewer) {
                    return Err(EngineError::invariant(format!(
                        "student {} is assigned twice to review student {}",
                        reviewer, reviewee
                    )));
                }
                *load.entry(*reviewer).or_default() += 1;
            }
        }

        if let Some((reviewer, count)) = load.iter().find(|(_, count)| **count > per_submission) {
            return Err(EngineError::invariant(format!(
                "student {} is assigned {} reviews, limit is {}",
                reviewer, count, per_submission
            )));
        }

        Ok(())
    }
}

impl ReviewPairing {
    /// 評審負擔 (每人需評的份數) 差距是否不超過 1
    pub fn is_balanced(&self) -> bool {
        let loads: Vec<usize> = self
            .reviewees()
            .into_iter()
            .map(|id| self.reviewer_load(id))
            .collect();
        match (loads.iter().min(), loads.iter().max()) {
            (Some(min), Some(max)) => max - min <= 1,
            _ => true,
        }
    }

    /// 所有欄位已填滿，且每人評審與被評次數都等於要求數
    pub fn is_complete(&self) -> bool {
        let per_submission = self.reviews_per_submission();
        self.slots().iter().all(|(reviewee, slots)| {
            slots.iter().all(Option::is_some) && self.reviewer_load(*reviewee) == per_submission
        })
    }
}
