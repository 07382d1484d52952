//! Term keys: the groups a penalty rule sums over.

use chrono::NaiveDate;
use shiftplan_core::domain::Resource;
use shiftplan_core::{EmployeeId, UnitId};

/// Identifies one group of a rule, e.g. "employee E on date D".
///
/// The director keeps one cached penalty per `(rule, key)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TermKey {
    /// A single unit, whoever holds it.
    Unit(UnitId),
    EmployeeDate(EmployeeId, NaiveDate),
    /// Keyed by the Monday of the week.
    EmployeeWeek(EmployeeId, NaiveDate),
    EmployeeMonth(EmployeeId, (i32, u32)),
    Employee(EmployeeId),
    /// One lane of a resource on a date.
    ResourceLane(Resource, u32, NaiveDate),
    /// Index into the model's demand slots.
    Demand(usize),
    /// Index into the model's groups, on a date.
    GroupDate(usize, NaiveDate),
}
