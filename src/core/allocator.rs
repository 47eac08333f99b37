//! 同儕互評配對
//!
//! 名單洗牌後視為環狀排列，位置 `i` 的作業由 `i+1 ..= i+k (mod n)` 評審。
//! 在 `1 <= k < n` 時不會自評，且每人剛好評 k 份、被評 k 次。

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

use crate::domain::model::{ReviewPairing, SlotRef, StudentId};
use crate::utils::error::{EngineError, Result};
use crate::utils::validation::{validate_roster, Validate};

pub fn allocate<R: Rng + ?Sized>(
    student_ids: &[StudentId],
    reviews_per_submission: usize,
    rng: &mut R,
) -> Result<ReviewPairing> {
    validate_roster(student_ids)?;
    if student_ids.len() < 2 {
        return Err(EngineError::invalid_input(
            "peer review needs at least 2 students",
        ));
    }
    if reviews_per_submission == 0 {
        return Err(EngineError::invalid_input(
            "reviews per submission must be positive",
        ));
    }
    if reviews_per_submission >= student_ids.len() {
        return Err(EngineError::SizeExceedsRoster {
            requested: reviews_per_submission,
            roster_len: student_ids.len(),
        });
    }

    let mut cycle = student_ids.to_vec();
    cycle.shuffle(rng);

    let n = cycle.len();
    let reviews: BTreeMap<StudentId, Vec<Option<StudentId>>> = cycle
        .iter()
        .enumerate()
        .map(|(i, reviewee)| {
            let reviewers = (1..=reviews_per_submission)
                .map(|offset| Some(cycle[(i + offset) % n]))
                .collect();
            (*reviewee, reviewers)
        })
        .collect();

    tracing::debug!(
        "Allocated {} reviewers for each of {} submissions",
        reviews_per_submission,
        n
    );

    Ok(ReviewPairing::from_slots(reviews_per_submission, reviews))
}

impl ReviewPairing {
    /// 丟棄目前配對，以新的排列重新計算
    pub fn rerandomize<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ReviewPairing> {
        allocate(&self.reviewees(), self.reviews_per_submission(), rng)
    }

    /// 交換兩位不同被評者的評審欄位 (任一欄位可為空)
    pub fn swap_reviewers(&mut self, a: SlotRef, b: SlotRef) -> Result<()> {
        if a.reviewee == b.reviewee {
            return Err(EngineError::invalid_input(format!(
                "both slots belong to student {}; pick slots of different submissions",
                a.reviewee
            )));
        }
        let reviewer_a = self.slot(a)?;
        let reviewer_b = self.slot(b)?;

        self.check_placement(reviewer_b, a)?;
        self.check_placement(reviewer_a, b)?;

        let mut candidate = self.clone();
        candidate.set_slot(a, reviewer_b);
        candidate.set_slot(b, reviewer_a);
        self.commit(candidate)
    }

    /// 將評審從一個欄位移到另一位被評者的空欄位
    pub fn move_reviewer(&mut self, from: SlotRef, to: SlotRef) -> Result<()> {
        if from.reviewee == to.reviewee {
            return Err(EngineError::invalid_input(format!(
                "both slots belong to student {}; pick slots of different submissions",
                from.reviewee
            )));
        }
        let reviewer = self.slot(from)?.ok_or_else(|| {
            EngineError::invalid_input(format!(
                "slot {} of student {} has no reviewer to move",
                from.slot, from.reviewee
            ))
        })?;
        if let Some(existing) = self.slot(to)? {
            return Err(EngineError::invalid_input(format!(
                "slot {} of student {} is already taken by {}",
                to.slot, to.reviewee, existing
            )));
        }

        self.check_placement(Some(reviewer), to)?;

        let mut candidate = self.clone();
        candidate.set_slot(from, None);
        candidate.set_slot(to, Some(reviewer));
        self.commit(candidate)
    }

    /// 退選：移除該生的作業，並清空其擔任評審的欄位
    pub fn remove_student(&mut self, student: StudentId) -> Result<Vec<SlotRef>> {
        if self.slots_mut().remove(&student).is_none() {
            return Err(EngineError::invalid_input(format!(
                "student {} is not part of this review assignment",
                student
            )));
        }

        let mut vacated = Vec::new();
        for (reviewee, slots) in self.slots_mut().iter_mut() {
            for (index, slot) in slots.iter_mut().enumerate() {
                if *slot == Some(student) {
                    *slot = None;
                    vacated.push(SlotRef::new(*reviewee, index));
                }
            }
        }

        tracing::debug!(
            "Removed student {} from review assignment, {} slots vacated",
            student,
            vacated.len()
        );
        Ok(vacated)
    }

    fn slot(&self, slot: SlotRef) -> Result<Option<StudentId>> {
        let slots = self.slots().get(&slot.reviewee).ok_or_else(|| {
            EngineError::invalid_input(format!(
                "student {} is not part of this review assignment",
                slot.reviewee
            ))
        })?;
        slots.get(slot.slot).copied().ok_or_else(|| {
            EngineError::invalid_input(format!(
                "student {} has no reviewer slot {}",
                slot.reviewee, slot.slot
            ))
        })
    }

    fn set_slot(&mut self, slot: SlotRef, reviewer: Option<StudentId>) {
        if let Some(cell) = self
            .slots_mut()
            .get_mut(&slot.reviewee)
            .and_then(|slots| slots.get_mut(slot.slot))
        {
            *cell = reviewer;
        }
    }

    /// 放入 `target` 後不可自評，也不可與該被評者的其他評審重複
    fn check_placement(&self, reviewer: Option<StudentId>, target: SlotRef) -> Result<()> {
        let Some(reviewer) = reviewer else {
            return Ok(());
        };

        if reviewer == target.reviewee {
            return Err(EngineError::invariant(format!(
                "student {} cannot review their own submission",
                reviewer
            )));
        }

        let duplicate = self
            .slots()
            .get(&target.reviewee)
            .map(|slots| {
                slots
                    .iter()
                    .enumerate()
                    .any(|(i, s)| i != target.slot && *s == Some(reviewer))
            })
            .unwrap_or(false);
        if duplicate {
            return Err(EngineError::invariant(format!(
                "student {} already reviews student {}",
                reviewer, target.reviewee
            )));
        }
        Ok(())
    }

    fn commit(&mut self, candidate: ReviewPairing) -> Result<()> {
        if let Err(e) = candidate.validate() {
            tracing::warn!("Rejected review edit: {}", e);
            return Err(e);
        }
        *self = candidate;
        Ok(())
    }
}
