//! Unit tests for cs-dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;

use cs_core::{CrewmanId, OccurrenceId, PhaseId, SimTime, TaskId, TimeDistribution, TypeCode};
use cs_model::{Crew, Crewman, RelativeDateType, SimPhase, Task, TaskOccurrence};

use crate::*;

// ── Mock engine ───────────────────────────────────────────────────────────────

/// Minimal engine side: an occurrence arena and a crew, with interruptions
/// recorded instead of scheduled.
struct MockContext {
    now:         SimTime,
    phase:       SimPhase,
    crew:        Crew,
    occurrences: Vec<TaskOccurrence>,
    qualified:   BTreeMap<TaskId, Vec<(CrewmanId, u8)>>,
    interrupted: Vec<(OccurrenceId, bool)>,
    notified:    Vec<(Option<CrewmanId>, Option<OccurrenceId>)>,
}

impl MockContext {
    fn new(crew: Crew) -> Self {
        let mut qualified: BTreeMap<TaskId, Vec<(CrewmanId, u8)>> = BTreeMap::new();
        for c in crew.iter() {
            for (&task, &q) in &c.qualifications {
                if q > 0 {
                    qualified.entry(task).or_default().push((c.id, q));
                }
            }
        }
        Self {
            now: SimTime::ZERO,
            phase: SimPhase {
                id:         PhaseId(1),
                name:       "Test".into(),
                phase_type: TypeCode(1),
                duration:   TimeDistribution::constant(SimTime::days(1.0)),
                tasks:      Vec::new(),
                begin:      SimTime::ZERO,
            },
            crew,
            occurrences: Vec::new(),
            qualified,
            interrupted: Vec::new(),
            notified: Vec::new(),
        }
    }

    fn add(&mut self, task: Task) -> OccurrenceId {
        let id = OccurrenceId(self.occurrences.len() as u32);
        self.occurrences.push(TaskOccurrence::new(id, Arc::new(task)));
        id
    }

    fn occ_mut(&mut self, id: OccurrenceId) -> DispatchResult<&mut TaskOccurrence> {
        self.occurrences.get_mut(id.index()).ok_or(DispatchError::UnknownOccurrence(id))
    }

    fn assigned(&self, id: OccurrenceId) -> Vec<CrewmanId> {
        self.occurrences[id.index()].assigned.clone()
    }

    fn holding(&self, id: CrewmanId) -> Vec<OccurrenceId> {
        self.crew.get(id).unwrap().tasks_assigned().to_vec()
    }

    /// Every crewman listed on an occurrence lists it back, and vice versa.
    fn assert_symmetric(&self) {
        for o in &self.occurrences {
            for c in &o.assigned {
                assert!(self.holding(*c).contains(&o.id), "{c} missing {}", o.id);
            }
        }
        for c in self.crew.iter() {
            for o in c.tasks_assigned() {
                assert!(self.assigned(*o).contains(&c.id), "{o} missing {}", c.id);
            }
        }
    }
}

impl AssignmentContext for MockContext {
    fn now(&self) -> SimTime {
        self.now
    }

    fn phase(&self) -> &SimPhase {
        &self.phase
    }

    fn occurrence(&self, id: OccurrenceId) -> Option<&TaskOccurrence> {
        self.occurrences.get(id.index())
    }

    fn crewman(&self, id: CrewmanId) -> Option<&Crewman> {
        self.crew.get(id)
    }

    fn qualified_crew(&self, task: TaskId) -> &[(CrewmanId, u8)] {
        self.qualified.get(&task).map_or(&[], Vec::as_slice)
    }

    fn refresh_crewman(&mut self, id: CrewmanId) {
        let now = self.now;
        if let Some(c) = self.crew.get_mut(id) {
            c.refresh_status(now);
        }
    }

    fn assign(&mut self, crewman: CrewmanId, occurrence: OccurrenceId) -> DispatchResult<()> {
        let now = self.now;
        let occ = self.occ_mut(occurrence)?;
        if occ.assigned.contains(&crewman) {
            return Ok(());
        }
        occ.assigned.push(crewman);
        let is_work = occ.task().is_work();
        self.crew.try_get_mut(crewman)?.assign_task(now, occurrence, is_work);
        Ok(())
    }

    fn dismiss(&mut self, crewman: CrewmanId, occurrence: OccurrenceId) -> DispatchResult<()> {
        let now = self.now;
        let occ = self.occ_mut(occurrence)?;
        occ.assigned.retain(|&c| c != crewman);
        let is_work = occ.task().is_work();
        self.crew.try_get_mut(crewman)?.dismiss_task(now, occurrence, is_work);
        Ok(())
    }

    fn dismiss_all(&mut self, crewman: CrewmanId) -> DispatchResult<()> {
        let now = self.now;
        for o in self.crew.try_get_mut(crewman)?.dismiss_all_tasks(now) {
            self.occ_mut(o)?.assigned.retain(|&c| c != crewman);
        }
        Ok(())
    }

    fn interrupt(
        &mut self,
        occurrences:   &[OccurrenceId],
        try_again_now: bool,
        _recursive:    bool,
    ) -> DispatchResult<()> {
        for &o in occurrences {
            self.interrupted.push((o, try_again_now));
            for c in self.assigned(o) {
                self.dismiss(c, o)?;
            }
        }
        Ok(())
    }

    fn notify_assignment(&mut self, crewman: Option<CrewmanId>, occurrence: Option<OccurrenceId>) {
        self.notified.push((crewman, occurrence));
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn work(id: i32, priority: i32, crew_needed: u32) -> Task {
    let mut t = Task::new(TaskId(id), format!("T{id}"));
    t.relative_date = RelativeDateType::RelativeStartFromStartOfPhase;
    t.task_type = TypeCode(2);
    t.priority = priority;
    t.crew_needed = crew_needed;
    t
}

fn member(id: i32, name: &str, quals: &[(i32, u8)]) -> Crewman {
    quals
        .iter()
        .fold(Crewman::new(CrewmanId(id), name), |c, &(task, q)| c.with_qualification(TaskId(task), q))
}

fn crew(members: Vec<Crewman>) -> Crew {
    let mut crew = Crew::new("Crew");
    for c in members {
        crew.insert(c);
    }
    crew
}

// ── BasicDispatcher ───────────────────────────────────────────────────────────

#[cfg(test)]
mod basic_tests {
    use super::*;

    #[test]
    fn no_crew_needed_never_expires() {
        let mut ctx = MockContext::new(crew(vec![]));
        let occ = ctx.add(work(1, 100, 0));
        let expiry = BasicDispatcher::default().task_assignment(occ, &mut ctx).unwrap();
        assert_eq!(expiry, NEVER_EXPIRES);
        assert_eq!(ctx.notified, vec![(None, Some(occ))]);
    }

    #[test]
    fn assigns_best_qualified_and_expires_after_four_hours() {
        let mut ctx = MockContext::new(crew(vec![member(1, "Alice", &[(1, 50)]), member(2, "Bob", &[(1, 60)])]));
        ctx.now = SimTime::hours(2.0);
        let occ = ctx.add(work(1, 100, 1));
        let expiry = BasicDispatcher::default().task_assignment(occ, &mut ctx).unwrap();
        assert_eq!(expiry, SimTime::hours(6.0));
        assert_eq!(ctx.assigned(occ), vec![CrewmanId(2)]);
        assert_eq!(ctx.notified, vec![(Some(CrewmanId(2)), Some(occ))]);
        ctx.assert_symmetric();
    }

    #[test]
    fn cumulated_hours_lower_the_score() {
        let mut ctx = MockContext::new(crew(vec![member(1, "Alice", &[(1, 100)]), member(2, "Bob", &[(1, 90)])]));
        let earlier = ctx.add(work(9, 0, 1));
        ctx.assign(CrewmanId(1), earlier).unwrap();
        ctx.now = SimTime::hours(60.0);
        ctx.dismiss(CrewmanId(1), earlier).unwrap();
        // Alice: 500 - 60 = 440, Bob: 450.
        let occ = ctx.add(work(1, 100, 1));
        BasicDispatcher::default().task_assignment(occ, &mut ctx).unwrap();
        assert_eq!(ctx.assigned(occ), vec![CrewmanId(2)]);
    }

    #[test]
    fn fails_without_enough_candidates() {
        let mut ctx = MockContext::new(crew(vec![member(1, "Alice", &[(1, 80)]), member(2, "Bob", &[])]));
        let occ = ctx.add(work(1, 100, 2));
        let expiry = BasicDispatcher::default().task_assignment(occ, &mut ctx).unwrap();
        assert!(expiry.is_negative());
        assert!(ctx.assigned(occ).is_empty());
        assert!(ctx.notified.is_empty());
    }

    #[test]
    fn same_priority_class_is_not_preempted() {
        let mut ctx = MockContext::new(crew(vec![member(1, "Alice", &[(1, 80), (2, 80)])]));
        let running = ctx.add(work(2, 150, 1));
        ctx.assign(CrewmanId(1), running).unwrap();
        let occ = ctx.add(work(1, 199, 1));
        let expiry = BasicDispatcher::default().task_assignment(occ, &mut ctx).unwrap();
        assert_eq!(expiry, ASSIGNMENT_FAILED);
        assert_eq!(ctx.holding(CrewmanId(1)), vec![running]);
        assert!(ctx.interrupted.is_empty());
    }

    #[test]
    fn higher_priority_class_preempts() {
        let mut ctx = MockContext::new(crew(vec![member(1, "Alice", &[(1, 80), (2, 80)])]));
        let running = ctx.add(work(2, 150, 1));
        ctx.assign(CrewmanId(1), running).unwrap();
        let occ = ctx.add(work(1, 200, 1));
        BasicDispatcher::default().task_assignment(occ, &mut ctx).unwrap();
        assert_eq!(ctx.interrupted, vec![(running, true)]);
        assert_eq!(ctx.holding(CrewmanId(1)), vec![occ]);
        assert!(ctx.assigned(running).is_empty());
        ctx.assert_symmetric();
    }

    #[test]
    fn reassigning_a_held_occurrence_keeps_one_link() {
        let mut ctx = MockContext::new(crew(vec![member(1, "Alice", &[(1, 80)])]));
        let occ = ctx.add(work(1, 100, 1));
        let d = BasicDispatcher::new(SimTime::hours(1.0));
        d.task_assignment(occ, &mut ctx).unwrap();
        ctx.now = SimTime::hours(1.0);
        let expiry = d.task_assignment(occ, &mut ctx).unwrap();
        assert_eq!(expiry, SimTime::hours(2.0));
        assert_eq!(ctx.assigned(occ), vec![CrewmanId(1)]);
        assert_eq!(ctx.holding(CrewmanId(1)), vec![occ]);
        ctx.assert_symmetric();
    }

    #[test]
    fn picks_top_n_of_many() {
        let mut ctx = MockContext::new(crew(vec![
            member(1, "A", &[(1, 10)]),
            member(2, "B", &[(1, 90)]),
            member(3, "C", &[(1, 50)]),
            member(4, "D", &[(1, 70)]),
        ]));
        let occ = ctx.add(work(1, 100, 2));
        BasicDispatcher::default().task_assignment(occ, &mut ctx).unwrap();
        let mut assigned = ctx.assigned(occ);
        assigned.sort();
        assert_eq!(assigned, vec![CrewmanId(2), CrewmanId(4)]);
    }

    #[test]
    fn unknown_occurrence_is_an_error() {
        let mut ctx = MockContext::new(crew(vec![]));
        let err = BasicDispatcher::default().task_assignment(OccurrenceId(3), &mut ctx);
        assert!(matches!(err, Err(DispatchError::UnknownOccurrence(OccurrenceId(3)))));
    }
}

// ── Default dismissal ─────────────────────────────────────────────────────────

#[cfg(test)]
mod dismiss_tests {
    use super::*;

    #[test]
    fn dismiss_releases_everyone_and_reports_it() {
        let mut ctx = MockContext::new(crew(vec![member(1, "Alice", &[(1, 80)]), member(2, "Bob", &[(1, 80)])]));
        let occ = ctx.add(work(1, 100, 2));
        let d = BasicDispatcher::default();
        d.task_assignment(occ, &mut ctx).unwrap();
        ctx.notified.clear();
        ctx.now = SimTime::hours(1.0);
        d.task_dismiss(occ, &mut ctx).unwrap();
        assert!(ctx.assigned(occ).is_empty());
        assert!(ctx.crew.iter().all(Crewman::is_idle));
        assert_eq!(ctx.notified.len(), 2);
        assert!(ctx.notified.iter().all(|(c, o)| c.is_some() && o.is_none()));
        assert_eq!(ctx.crew.get(CrewmanId(1)).unwrap().cumulated_work_time(), SimTime::hours(1.0));
    }
}
