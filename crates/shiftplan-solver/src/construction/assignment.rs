//! Block-wise greedy constructor for the assignment stage.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use rand::Rng;
use shiftplan_config::SolverConfig;
use shiftplan_core::domain::{Resource, MIN_QUALIFYING_LEVEL};
use shiftplan_core::{
    AssignableUnit, DomainModel, EmployeeId, Result, TimeWindow, UnitId, UnitShape,
};
use shiftplan_scoring::IncrementalDirector;
use smallvec::SmallVec;
use tracing::{info, trace};

use super::{ConstructionSummary, Constructor};

/// Walks resources in opening order and hands each contiguous block of
/// slots to the most skilled, least loaded attendee.
///
/// Registers come first: auto-open targets, then ascending open priority,
/// then register number. Tasks follow by code. A block never exceeds the
/// resource's allowance.
#[derive(Debug, Clone)]
pub struct AssignmentConstructor {
    block_max_minutes: i64,
    min_block_minutes: i64,
    min_skill_level: u8,
}

impl AssignmentConstructor {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            block_max_minutes: config.construction.block_max_minutes,
            min_block_minutes: config.construction.slot_minutes,
            min_skill_level: config.eligibility.min_skill_level,
        }
    }

    fn allowance(&self, model: &DomainModel, resource: &Resource) -> i64 {
        model
            .max_allowance(resource)
            .unwrap_or(self.block_max_minutes)
            .max(self.min_block_minutes)
            .max(model.slot_minutes())
    }

    /// Assigns every unit of `block` to the first fitting candidate.
    fn place_block(
        &self,
        director: &mut IncrementalDirector,
        model: &DomainModel,
        ledger: &mut HashMap<(EmployeeId, NaiveDate), DayLoad>,
        block: &[UnitId],
    ) -> Result<bool> {
        let (Some(first), Some(last)) = (block.first(), block.last()) else {
            return Ok(false);
        };
        let head = director.unit(*first);
        let date = head.date();
        let Some(resource) = head.resource().cloned() else {
            return Ok(false);
        };
        let span = TimeWindow::new(head.window().start, director.unit(*last).window().end);

        let mut ranked: Vec<(Reverse<u8>, i64, EmployeeId)> = head
            .candidates
            .iter()
            .copied()
            .filter(|e| block.iter().all(|id| director.unit(*id).accepts(Some(*e))))
            .filter_map(|e| {
                let level = model.skill_level(e, &resource);
                if level.is_some_and(|l| l < self.min_skill_level) {
                    return None;
                }
                let minutes = ledger.get(&(e, date)).map_or(0, |load| load.minutes);
                Some((Reverse(level.unwrap_or(MIN_QUALIFYING_LEVEL)), minutes, e))
            })
            .collect();
        ranked.sort_unstable();

        let Some(employee) = ranked
            .into_iter()
            .map(|(_, _, e)| e)
            .find(|e| {
                ledger
                    .get(&(*e, date))
                    .map_or(true, |load| !load.windows.iter().any(|w| w.overlaps(&span)))
            })
        else {
            trace!(event = "block_unfilled", resource = %resource, date = %date, window = %span);
            return Ok(false);
        };

        for id in block {
            director.begin_change(*id).commit(Some(employee))?;
        }
        let load = ledger.entry((employee, date)).or_default();
        load.minutes += span.minutes();
        load.windows.push(span);
        Ok(true)
    }
}

#[derive(Debug, Default)]
struct DayLoad {
    minutes: i64,
    windows: SmallVec<[TimeWindow; 4]>,
}

/// Position of each resource in opening order.
fn resource_order(model: &DomainModel, units: &[AssignableUnit]) -> HashMap<Resource, usize> {
    let mut registers: Vec<_> = model.registers().iter().collect();
    registers.sort_by_key(|r| {
        (
            !r.auto_open_target,
            r.open_priority.unwrap_or(u32::MAX),
            r.number,
        )
    });
    let mut tasks: Vec<_> = model.tasks().iter().map(|t| t.code.clone()).collect();
    tasks.sort();

    let mut order: HashMap<Resource, usize> = HashMap::new();
    let known = registers
        .into_iter()
        .map(|r| Resource::Register(r.number))
        .chain(tasks.into_iter().map(Resource::Task));
    for resource in known {
        let next = order.len();
        order.entry(resource).or_insert(next);
    }

    let mut unknown: Vec<&Resource> = units
        .iter()
        .filter_map(AssignableUnit::resource)
        .filter(|r| !order.contains_key(*r))
        .collect();
    unknown.sort();
    unknown.dedup();
    for resource in unknown {
        let next = order.len();
        order.insert(resource.clone(), next);
    }
    order
}

impl Constructor for AssignmentConstructor {
    fn construct<R: Rng>(
        &self,
        director: &mut IncrementalDirector,
        _rng: &mut R,
    ) -> Result<ConstructionSummary> {
        let model = Arc::clone(director.shared_model());
        let order = resource_order(&model, director.units());

        let mut lanes: BTreeMap<(NaiveDate, usize, u32), Vec<UnitId>> = BTreeMap::new();
        for unit in director.units() {
            if let UnitShape::Assignment {
                date,
                resource,
                lane,
                ..
            } = &unit.shape
            {
                let rank = order.get(resource).copied().unwrap_or(usize::MAX);
                lanes.entry((*date, rank, *lane)).or_default().push(unit.id);
            }
        }

        let mut ledger = HashMap::new();
        let mut blocks = 0usize;
        let mut unfilled = 0usize;
        for ids in lanes.values_mut() {
            ids.sort_by_key(|id| director.unit(*id).window().start);
            let allowance = match director.unit(ids[0]).resource() {
                Some(resource) => self.allowance(&model, resource),
                None => continue,
            };

            let mut block: SmallVec<[UnitId; 8]> = SmallVec::new();
            let mut start = None;
            let mut end = None;
            for id in ids.iter() {
                let unit = director.unit(*id);
                let window = unit.window();
                if unit.pinned || unit.assigned.is_some() {
                    if !block.is_empty() {
                        blocks += 1;
                        if !self.place_block(director, &model, &mut ledger, &block)? {
                            unfilled += 1;
                        }
                        block.clear();
                    }
                    start = None;
                    end = None;
                    continue;
                }
                let extends = end == Some(window.start)
                    && start.is_some_and(|s| TimeWindow::new(s, window.end).minutes() <= allowance);
                if !extends && !block.is_empty() {
                    blocks += 1;
                    if !self.place_block(director, &model, &mut ledger, &block)? {
                        unfilled += 1;
                    }
                    block.clear();
                }
                if block.is_empty() {
                    start = Some(window.start);
                }
                block.push(*id);
                end = Some(window.end);
            }
            if !block.is_empty() {
                blocks += 1;
                if !self.place_block(director, &model, &mut ledger, &block)? {
                    unfilled += 1;
                }
            }
        }

        let summary = ConstructionSummary::of(director, 0);
        info!(
            event = "construction_end",
            stage = "ASSIGNMENT",
            units = summary.units,
            assigned = summary.assigned,
            blocks,
            unfilled_blocks = unfilled,
            score = %director.score(),
        );
        Ok(summary)
    }
}
