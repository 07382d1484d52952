//! Skill levels per employee and resource.

use std::collections::HashMap;

use super::Resource;

/// Levels 0 and 1 disqualify; 2 and above qualify.
pub const MIN_QUALIFYING_LEVEL: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterSkill {
    pub employee_code: String,
    pub register: u32,
    pub level: u8,
}

/// Skill for a department or one of its task codes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskSkill {
    pub employee_code: String,
    pub code: String,
    pub level: u8,
}

/// Lookup of skill levels by employee code.
#[derive(Debug, Clone, Default)]
pub struct SkillMap {
    registers: HashMap<(String, u32), u8>,
    tasks: HashMap<(String, String), u8>,
}

impl SkillMap {
    pub fn new(registers: &[RegisterSkill], tasks: &[TaskSkill]) -> Self {
        Self {
            registers: registers
                .iter()
                .map(|s| ((s.employee_code.clone(), s.register), s.level))
                .collect(),
            tasks: tasks
                .iter()
                .map(|s| ((s.employee_code.clone(), s.code.clone()), s.level))
                .collect(),
        }
    }

    /// Level for a resource, `None` when unconstrained.
    pub fn level(&self, employee_code: &str, resource: &Resource) -> Option<u8> {
        match resource {
            Resource::Register(no) => self
                .registers
                .get(&(employee_code.to_string(), *no))
                .copied(),
            Resource::Task(code) => self.task_level(employee_code, code),
        }
    }

    pub fn task_level(&self, employee_code: &str, code: &str) -> Option<u8> {
        self.tasks
            .get(&(employee_code.to_string(), code.to_string()))
            .copied()
    }

    /// True when the level is absent or at least `min_level`.
    pub fn permits(level: Option<u8>, min_level: u8) -> bool {
        level.map_or(true, |l| l >= min_level)
    }
}
