//! 隨機分組
//!
//! 名單先以 Fisher–Yates 洗牌，再以輪流 (round-robin) 方式分配到
//! `ceil(n / group_size)` 個組別，因此各組人數差距不超過 1。

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::model::{Group, GroupPolicy, Grouping, StudentId};
use crate::utils::error::{EngineError, Result};
use crate::utils::validation::{validate_roster, Validate};

pub fn partition<R: Rng + ?Sized>(
    student_ids: &[StudentId],
    group_size: usize,
    rng: &mut R,
) -> Result<Grouping> {
    partition_with_policy(student_ids, group_size, GroupPolicy::default(), rng)
}

pub fn partition_with_policy<R: Rng + ?Sized>(
    student_ids: &[StudentId],
    group_size: usize,
    policy: GroupPolicy,
    rng: &mut R,
) -> Result<Grouping> {
    if group_size == 0 {
        return Err(EngineError::invalid_input("group size must be positive"));
    }
    validate_roster(student_ids)?;
    if group_size > student_ids.len() {
        return Err(EngineError::SizeExceedsRoster {
            requested: group_size,
            roster_len: student_ids.len(),
        });
    }

    let mut shuffled = student_ids.to_vec();
    shuffled.shuffle(rng);

    let number_of_groups = shuffled.len().div_ceil(group_size);
    let mut buckets: Vec<Vec<StudentId>> = vec![Vec::new(); number_of_groups];
    for (index, student) in shuffled.into_iter().enumerate() {
        buckets[index % number_of_groups].push(student);
    }

    let groups = buckets
        .into_iter()
        .enumerate()
        .map(|(index, members)| {
            Ok(Group {
                id: group_number(index)?,
                members,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        "Partitioned {} students into {} groups (target size {})",
        student_ids.len(),
        number_of_groups,
        group_size
    );

    Ok(Grouping {
        target_size: group_size,
        groups,
        policy,
    })
}

/// 第 `index` 個組別 (0 起算) 的編號
pub(crate) fn group_number(index: usize) -> Result<u32> {
    index
        .checked_add(1)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            EngineError::internal(format!(
                "group index {} exceeds the group number range",
                index
            ))
        })
}

impl Grouping {
    /// 以目前成員與目標人數重新隨機分組
    pub fn rerandomize<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Grouping> {
        partition_with_policy(&self.members(), self.target_size, self.policy, rng)
    }

    /// 交換兩位不同組的學生，其他成員位置不變
    pub fn swap_students(&mut self, a: StudentId, b: StudentId) -> Result<()> {
        let (group_a, index_a) = self.locate(a)?;
        let (group_b, index_b) = self.locate(b)?;
        if group_a == group_b {
            return Err(EngineError::invalid_input(format!(
                "students {} and {} are already in the same group",
                a, b
            )));
        }

        let mut candidate = self.clone();
        candidate.groups[group_a].members[index_a] = b;
        candidate.groups[group_b].members[index_b] = a;
        self.commit(candidate)
    }

    /// 將學生移到另一組；是否允許留下空組由 `GroupPolicy` 決定
    pub fn move_student(&mut self, student: StudentId, to_group: u32) -> Result<()> {
        let (from, index) = self.locate(student)?;
        let to = self.group_index(to_group)?;
        if from == to {
            return Err(EngineError::invalid_input(format!(
                "student {} is already in group {}",
                student, to_group
            )));
        }

        if self.groups[from].len() == 1 && !self.policy.allow_empty_groups {
            return Err(EngineError::invariant(format!(
                "moving student {} would leave group {} empty",
                student, self.groups[from].id
            )));
        }

        let mut candidate = self.clone();
        candidate.groups[from].members.remove(index);
        candidate.groups[to].members.push(student);
        self.commit(candidate)
    }

    /// 新加入的學生放進人數最少的組 (同人數時取編號最小者)
    pub fn add_student(&mut self, student: StudentId) -> Result<u32> {
        if let Some(group_id) = self.group_of(student) {
            return Err(EngineError::invariant(format!(
                "student {} is already in group {}",
                student, group_id
            )));
        }

        let target = self
            .groups
            .iter()
            .enumerate()
            .min_by_key(|(index, group)| (group.len(), *index))
            .map(|(index, _)| index)
            .ok_or_else(|| EngineError::invalid_input("grouping has no groups"))?;

        let mut candidate = self.clone();
        candidate.groups[target].members.push(student);
        let group_id = candidate.groups[target].id;
        self.commit(candidate)?;
        Ok(group_id)
    }

    /// 退選：從所屬組別移除。若政策不允許空組，清空的組別會被刪除並重新編號
    pub fn remove_student(&mut self, student: StudentId) -> Result<u32> {
        let (group, index) = self.locate(student)?;
        let group_id = self.groups[group].id;

        let mut candidate = self.clone();
        candidate.groups[group].members.remove(index);
        if candidate.groups[group].is_empty() && !candidate.policy.allow_empty_groups {
            candidate.groups.remove(group);
            for (position, remaining) in candidate.groups.iter_mut().enumerate() {
                remaining.id = group_number(position)?;
            }
            tracing::debug!(
                "Dropped empty group {} after removing student {}",
                group_id,
                student
            );
        }

        self.commit(candidate)?;
        tracing::debug!("Removed student {} from group {}", student, group_id);
        Ok(group_id)
    }

    fn locate(&self, student: StudentId) -> Result<(usize, usize)> {
        self.groups
            .iter()
            .enumerate()
            .find_map(|(g, group)| {
                group
                    .members
                    .iter()
                    .position(|m| *m == student)
                    .map(|i| (g, i))
            })
            .ok_or_else(|| {
                EngineError::invalid_input(format!("student {} is not in any group", student))
            })
    }

    fn group_index(&self, group_id: u32) -> Result<usize> {
        self.groups
            .iter()
            .position(|g| g.id == group_id)
            .ok_or_else(|| EngineError::invalid_input(format!("group {} does not exist", group_id)))
    }

    fn commit(&mut self, candidate: Grouping) -> Result<()> {
        if let Err(e) = candidate.validate() {
            tracing::warn!("Rejected group edit: {}", e);
            return Err(e);
        }
        *self = candidate;
        Ok(())
    }
}
