//! Unit tests for cs-model.

use std::collections::BTreeMap;
use std::sync::Arc;

use cs_core::{CrewmanId, OccurrenceId, PhaseId, SimTime, TaskId, TimeDistribution, TypeCode};

use crate::*;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn task(id: i32, name: &str) -> Task {
    let mut t = Task::new(TaskId(id), name);
    t.relative_date = RelativeDateType::RelativeStartFromStartOfPhase;
    t.duration = TimeDistribution::constant(SimTime::hours(1.0));
    t
}

fn table(ids: &[i32]) -> TaskTable {
    let mut table = TaskTable::new();
    for &id in ids {
        table.insert(task(id, &format!("T{id}"))).unwrap();
    }
    table
}

fn phase(name: &str, hours: f64) -> Phase {
    Phase::new(name, TypeCode(1), TimeDistribution::constant(SimTime::hours(hours)))
}

fn ids(set: &std::collections::BTreeSet<TaskId>) -> Vec<i32> {
    set.iter().map(|t| t.0).collect()
}

// ── Task ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod task_tests {
    use super::*;

    #[test]
    fn policies_parse_names_codes_and_aliases() {
        assert_eq!(
            "dropwithouterror".parse::<PhaseInterruptionPolicy>().unwrap(),
            PhaseInterruptionPolicy::DropWithoutError
        );
        assert_eq!("17".parse::<PhaseInterruptionPolicy>().unwrap(), PhaseInterruptionPolicy::DropWithoutError);
        assert_eq!("DontInterrupt".parse::<PhaseInterruptionPolicy>().unwrap(), PhaseInterruptionPolicy::DoNotInterrupt);
        assert_eq!(
            "RelativeStartFromPreviousStartOccurence".parse::<RelativeDateType>().unwrap(),
            RelativeDateType::Frequency
        );
        assert_eq!("Frequency (every n hours)".parse::<RelativeDateType>().unwrap(), RelativeDateType::Frequency);
        assert_eq!("bogus".parse::<TaskInterruptionPolicy>().unwrap(), TaskInterruptionPolicy::Undefined);
        assert_eq!(RelativeDateType::RelativeStopFromEndOfPhase.code(), -2);
        assert_eq!(TaskDuplicatesPolicy::from_code(4), Some(TaskDuplicatesPolicy::RejectNewDuplicates));
    }

    #[test]
    fn relation_kind_parse_rejects_unknown() {
        assert_eq!("Slave".parse::<RelationKind>().unwrap(), RelationKind::Slave);
        assert_eq!("-7".parse::<RelationKind>().unwrap(), RelationKind::Master);
        assert!("sibling".parse::<RelationKind>().is_err());
    }

    #[test]
    fn new_task_defaults() {
        let t = Task::new(TaskId(1), "Watch");
        assert!(t.enabled);
        assert_eq!(t.crew_needed, 1);
        assert_eq!(t.task_interruption, TaskInterruptionPolicy::ContinueOrResumeWithoutError);
        assert_eq!(t.scenario_interruption, ScenarioInterruptionPolicy::DropWithoutError);
        assert!(t.needs_duplicate_management());
        assert_eq!(t.to_string(), "1.Watch");
    }

    #[test]
    fn no_duplicate_flag_maps_to_kill_old() {
        let mut t = task(1, "A");
        t.set_no_duplicate(true);
        assert_eq!(t.duplicates, TaskDuplicatesPolicy::KillOldDuplicates);
        t.set_no_duplicate(false);
        assert!(!t.needs_duplicate_management());
    }

    #[test]
    fn work_excludes_idle_rest_and_internal_wait() {
        let mut t = task(1, "A");
        for (code, work) in [(0, false), (2, true), (3, false), (31, false), (49, false), (4, true)] {
            t.task_type = TypeCode(code);
            assert_eq!(t.is_work(), work, "type {code}");
        }
    }

    #[test]
    fn phase_dependency_and_triggering() {
        let mut t = task(1, "A");
        assert!(t.is_phase_dependent());
        t.relative_date = RelativeDateType::Frequency;
        assert!(!t.is_phase_dependent());
        t.relative_date = RelativeDateType::TriggeredByAnEvent;
        assert!(t.is_triggered());
    }

    #[test]
    fn allowed_in_uses_sub_codes() {
        let mut t = task(1, "A");
        t.phase_types.push(TypeCode(3));
        assert!(t.allowed_in(TypeCode(3)));
        assert!(t.allowed_in(TypeCode(31)));
        assert!(!t.allowed_in(TypeCode(4)));
    }

    #[test]
    fn error_messages() {
        assert!(Task::new(TaskId(1), "A").error_message().unwrap().contains("relative date"));
        let mut t = task(1, "A");
        assert!(t.is_valid());
        t.relative_date = RelativeDateType::Frequency;
        assert!(t.error_message().unwrap().contains("positive frequency"));
        t.start_date = TimeDistribution::constant(SimTime::hours(4.0));
        assert!(t.is_valid());
        t.daily_hour_end = SimTime::hours(25.0);
        assert!(t.error_message().unwrap().contains("daily hours"));
    }

    #[test]
    fn validate_clamps_rotation() {
        let mut t = task(1, "A");
        t.rotation = SimTime::hours(30.0);
        t.validate();
        assert_eq!(t.rotation, SimTime::ONE_DAY);
        t.rotation = SimTime::hours(-1.0);
        t.validate();
        assert_eq!(t.rotation, SimTime::ZERO);
    }

    #[test]
    fn allowed_time_respects_window_and_sunday() {
        let mut t = task(1, "A");
        t.daily_hour_start = SimTime::hours(8.0);
        t.daily_hour_end = SimTime::hours(17.0);
        assert!(t.is_allowed_time(SimTime::hours(10.0)));
        assert!(!t.is_allowed_time(SimTime::hours(18.0)));
        let sunday_ten = SimTime::days(6.0) + SimTime::hours(10.0);
        assert!(t.is_allowed_time(sunday_ten));
        t.on_holidays = false;
        assert!(!t.is_allowed_time(sunday_ten));
    }

    #[test]
    fn next_possible_resume_skips_to_window_and_past_sunday() {
        let mut t = task(1, "A");
        t.daily_hour_start = SimTime::hours(8.0);
        t.daily_hour_end = SimTime::hours(17.0);
        assert_eq!(t.next_possible_resume(SimTime::hours(18.0), true), SimTime::hours(32.0));
        assert_eq!(t.next_possible_resume(SimTime::hours(10.0), true), SimTime::hours(10.0));

        t.on_holidays = false;
        let saturday_evening = SimTime::days(5.0) + SimTime::hours(18.0);
        let monday_morning = SimTime::days(7.0) + SimTime::hours(8.0);
        assert_eq!(t.next_possible_resume(saturday_evening, true), monday_morning);
    }

    #[test]
    fn expanded_copy_has_new_identity_and_no_relations() {
        let mut tasks = table(&[1, 2]);
        tasks.get_mut(TaskId(1)).unwrap().auto_expand = true;
        tasks.add_relation(TaskId(1), RelationKind::Parallel, TaskId(2)).unwrap();
        let copy = tasks.get(TaskId(1)).unwrap().expanded_copy(TaskId(5000), "1-01.Alice");
        assert_eq!(copy.id, TaskId(5000));
        assert_eq!(copy.name, "T1 | 1-01.Alice");
        assert_eq!(copy.expanded_from, Some(TaskId(1)));
        assert!(!copy.auto_expand);
        assert!(copy.parallels().is_empty());
    }
}

// ── TaskOverrides / TaskRef ───────────────────────────────────────────────────

#[cfg(test)]
mod overrides_tests {
    use super::*;

    #[test]
    fn apply_overrides_only_set_fields() {
        let base = task(1, "A");
        let overrides = TaskOverrides { priority: Some(300), crew_needed: Some(2), ..Default::default() };
        let t = overrides.apply(&base);
        assert_eq!(t.priority, 300);
        assert_eq!(t.crew_needed, 2);
        assert_eq!(t.duration, base.duration);
        assert!(!overrides.is_empty());
        assert!(TaskOverrides::default().is_empty());
    }

    #[test]
    fn date_offset_applies_to_periodic_tasks_only() {
        let offset = TimeDistribution::constant(SimTime::hours(2.0));
        let overrides = TaskOverrides { date_offset: Some(offset), ..Default::default() };
        let mut base = task(1, "A");
        assert_eq!(overrides.apply(&base).date_offset, base.date_offset);
        base.relative_date = RelativeDateType::Frequency;
        assert_eq!(overrides.apply(&base).date_offset, offset);
    }

    #[test]
    fn resolve_checks_the_id() {
        let r = TaskRef::new(TaskId(2));
        assert!(r.resolve(&task(1, "A")).is_none());
        assert_eq!(r.resolve(&task(2, "B")).unwrap().name, "B");
    }
}

// ── TaskTable ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod table_tests {
    use super::*;

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut t = table(&[1]);
        assert!(matches!(t.insert(task(1, "again")), Err(ModelError::DuplicateTask(TaskId(1)))));
        assert_eq!(t.next_task_id(), TaskId(2));
        assert_eq!(TaskTable::new().next_task_id(), TaskId(1));
    }

    #[test]
    fn parallel_groups_merge_into_complete_graph() {
        let mut t = table(&[1, 2, 3, 4]);
        t.add_relation(TaskId(1), RelationKind::Parallel, TaskId(2)).unwrap();
        t.add_relation(TaskId(3), RelationKind::Parallel, TaskId(4)).unwrap();
        t.add_relation(TaskId(2), RelationKind::Parallel, TaskId(3)).unwrap();
        for id in 1..=4 {
            let expected: Vec<i32> = (1..=4).filter(|&x| x != id).collect();
            assert_eq!(ids(t.get(TaskId(id)).unwrap().parallels()), expected, "task {id}");
        }
    }

    #[test]
    fn slave_and_master_mirror_each_other() {
        let mut t = table(&[1, 2, 3]);
        t.add_relation(TaskId(1), RelationKind::Slave, TaskId(2)).unwrap();
        t.add_relation(TaskId(3), RelationKind::Master, TaskId(1)).unwrap();
        assert_eq!(ids(t.get(TaskId(1)).unwrap().slaves()), vec![2, 3]);
        assert_eq!(ids(t.get(TaskId(2)).unwrap().masters()), vec![1]);
        assert_eq!(ids(t.get(TaskId(3)).unwrap().masters()), vec![1]);
    }

    #[test]
    fn rejects_self_and_two_cycles() {
        let mut t = table(&[1, 2]);
        assert!(t.add_relation(TaskId(1), RelationKind::Parallel, TaskId(1)).is_err());
        t.add_relation(TaskId(1), RelationKind::Slave, TaskId(2)).unwrap();
        assert!(matches!(
            t.add_relation(TaskId(2), RelationKind::Slave, TaskId(1)),
            Err(ModelError::InvalidRelation { .. })
        ));
        assert!(matches!(
            t.add_relation(TaskId(1), RelationKind::Slave, TaskId(9)),
            Err(ModelError::UnknownTask(TaskId(9)))
        ));
    }

    #[test]
    fn remove_unlinks_everywhere() {
        let mut t = table(&[1, 2, 3]);
        t.add_relation(TaskId(1), RelationKind::Parallel, TaskId(2)).unwrap();
        t.add_relation(TaskId(3), RelationKind::Slave, TaskId(2)).unwrap();
        let removed = t.remove(TaskId(2)).unwrap();
        assert!(removed.parallels().is_empty());
        assert!(t.get(TaskId(1)).unwrap().parallels().is_empty());
        assert!(t.get(TaskId(3)).unwrap().slaves().is_empty());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn update_relations_replaces_the_set() {
        let mut t = table(&[1, 2, 3, 4]);
        t.add_relation(TaskId(1), RelationKind::Parallel, TaskId(2)).unwrap();
        t.add_relation(TaskId(3), RelationKind::Parallel, TaskId(4)).unwrap();
        let added = t.update_relations(TaskId(1), RelationKind::Parallel, &[TaskId(3), TaskId(9)]).unwrap();
        assert_eq!(added, 1);
        assert_eq!(ids(t.get(TaskId(1)).unwrap().parallels()), vec![3]);
        assert!(t.get(TaskId(2)).unwrap().parallels().is_empty());
        assert!(t.get(TaskId(4)).unwrap().parallels().is_empty());
    }

    #[test]
    fn error_message_names_first_enabled_invalid_task() {
        let mut t = table(&[1, 2, 3]);
        t.get_mut(TaskId(1)).unwrap().relative_date = RelativeDateType::Undefined;
        t.get_mut(TaskId(1)).unwrap().enabled = false;
        t.get_mut(TaskId(2)).unwrap().relative_date = RelativeDateType::Undefined;
        let msg = t.error_message().unwrap();
        assert!(msg.starts_with("Invalid task “2.T2”"), "{msg}");
    }
}

// ── TaskOccurrence ────────────────────────────────────────────────────────────

#[cfg(test)]
mod occurrence_tests {
    use super::*;

    fn occurrence() -> TaskOccurrence {
        let mut o = TaskOccurrence::new(OccurrenceId(0), Arc::new(task(1, "A")));
        o.set_arrives(SimTime::ZERO);
        o.prepare_for_next_occurrence();
        o
    }

    #[test]
    fn progress_only_when_staffed() {
        let mut o = occurrence();
        assert_eq!(o.remaining(), SimTime::hours(1.0));
        assert_eq!(o.process_until_now(SimTime::minutes(20.0)), SimTime::ZERO);
        assert_eq!(o.remaining(), SimTime::hours(1.0));
        o.assigned.push(CrewmanId(1));
        assert_eq!(o.process_until_now(SimTime::minutes(50.0)), SimTime::minutes(30.0));
        assert_eq!(o.remaining(), SimTime::minutes(30.0));
    }

    #[test]
    fn remaining_never_goes_negative() {
        let mut o = occurrence();
        o.discard_until_now(SimTime::hours(5.0));
        assert_eq!(o.remaining(), SimTime::ZERO);
        assert!(o.completed());
    }

    #[test]
    fn sleep_skips_time() {
        let mut o = occurrence();
        o.assigned.push(CrewmanId(1));
        o.sleep_until_now(SimTime::minutes(40.0));
        o.process_until_now(SimTime::minutes(50.0));
        assert_eq!(o.remaining(), SimTime::minutes(50.0));
    }
}

// ── Crewman / Crew ────────────────────────────────────────────────────────────

#[cfg(test)]
mod crew_tests {
    use super::*;

    #[test]
    fn work_time_accumulates_only_under_load() {
        let mut c = Crewman::new(CrewmanId(1), "Alice");
        c.refresh_status(SimTime::ZERO);
        c.assign_task(SimTime::hours(1.0), OccurrenceId(7), true);
        c.refresh_status(SimTime::hours(3.0));
        assert_eq!(c.cumulated_work_time(), SimTime::hours(2.0));
        c.dismiss_task(SimTime::hours(4.0), OccurrenceId(7), true);
        c.refresh_status(SimTime::hours(10.0));
        assert_eq!(c.cumulated_work_time(), SimTime::hours(3.0));
        assert!(c.is_idle());
    }

    #[test]
    fn non_work_assignments_do_not_load() {
        let mut c = Crewman::new(CrewmanId(1), "Alice");
        c.assign_task(SimTime::ZERO, OccurrenceId(1), false);
        c.refresh_status(SimTime::hours(2.0));
        assert_eq!(c.current_load(), 0);
        assert_eq!(c.cumulated_work_time(), SimTime::ZERO);
        assert_eq!(c.tasks_assigned(), &[OccurrenceId(1)]);
    }

    #[test]
    fn dismiss_all_returns_assignments() {
        let mut c = Crewman::new(CrewmanId(1), "Alice");
        c.assign_task(SimTime::ZERO, OccurrenceId(1), true);
        c.assign_task(SimTime::ZERO, OccurrenceId(2), true);
        assert_eq!(c.dismiss_all_tasks(SimTime::hours(1.0)), vec![OccurrenceId(1), OccurrenceId(2)]);
        assert_eq!(c.current_load(), 0);
        c.prepare_for_next_replication();
        assert_eq!(c.cumulated_work_time(), SimTime::ZERO);
        assert_eq!(c.last_refresh(), SimTime::MIN);
    }

    #[test]
    fn crew_reports_understaffed_tasks() {
        let mut tasks = table(&[1, 2]);
        tasks.get_mut(TaskId(2)).unwrap().crew_needed = 2;
        let mut crew = Crew::new("Day");
        crew.insert(Crewman::new(CrewmanId(1), "Alice").with_qualification(TaskId(1), 80).with_qualification(TaskId(2), 50));
        crew.insert(Crewman::new(CrewmanId(2), "Bob").with_qualification(TaskId(2), 0));
        assert_eq!(crew.qualified_count(TaskId(2)), 1);
        assert_eq!(crew.error_message(&tasks).unwrap(), "Task “2.T2” is not correctly assigned!");
        tasks.get_mut(TaskId(2)).unwrap().auto_expand = true;
        assert!(crew.error_message(&tasks).is_none());
        assert_eq!(crew.next_crewman_id(), CrewmanId(3));
    }
}

// ── Phase / Scenario ──────────────────────────────────────────────────────────

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[test]
    fn phase_validation() {
        assert!(phase("P", 1.0).error_message().is_none());
        let untyped = Phase::new("P", TypeCode::NONE, TimeDistribution::constant(SimTime::hours(1.0)));
        assert!(untyped.error_message().unwrap().contains("type"));
        let exp = Phase::new("P", TypeCode(1), TimeDistribution::exponential(SimTime::hours(1.0)));
        assert!(exp.error_message().unwrap().contains("exponential"));
        assert!(phase("P", 0.05).error_message().unwrap().contains("minimum duration"));
        assert!(phase("P", 24.0 * 62.0).error_message().unwrap().contains("must not exceed"));
    }

    #[test]
    fn phase_ref_overrides_and_resolves() {
        let tasks = table(&[1, 2]);
        let origin = Arc::new(phase("Transit", 2.0).with_task(TaskRef::with_overrides(
            TaskId(2),
            TaskOverrides { priority: Some(500), ..Default::default() },
        )));
        let mut r = PhaseRef::new(origin);
        r.overrides.duration = Some(TimeDistribution::constant(SimTime::hours(5.0)));
        assert_eq!(r.duration().x_value(), SimTime::hours(5.0));
        assert!(r.contains_task(TaskId(2)));
        let sim = r.to_sim_phase(&tasks);
        assert_eq!(sim.tasks.len(), 1);
        assert_eq!(sim.tasks[0].priority, 500);
        assert!(sim.allows(tasks.get(TaskId(2)).unwrap()));
        assert!(!sim.allows(tasks.get(TaskId(1)).unwrap()));
    }

    #[test]
    fn add_phase_reuses_origin_or_loads() {
        let mut s = Scenario::new("S");
        let mut loads = 0;
        s.add_phase("A", |n| {
            loads += 1;
            Some(phase(n, 1.0))
        })
        .unwrap();
        s.add_phase("A", |_| unreachable!()).unwrap();
        assert_eq!(loads, 1);
        assert!(Arc::ptr_eq(s.phases[0].origin(), s.phases[1].origin()));
        assert!(matches!(s.add_phase("B", |_| None), Err(ModelError::UnknownPhase(_))));
        assert!(s.add_phase("", |n| Some(phase(n, 1.0))).is_err());
    }

    #[test]
    fn append_skips_system_phases() {
        let mut other = Scenario::new("O");
        other.push_phase(Arc::new(phase("!Init", 1.0)));
        other.push_phase(Arc::new(phase("Work", 1.0)));
        let mut s = Scenario::new("S");
        s.append(&other);
        let names: Vec<&str> = s.phases.iter().map(PhaseRef::name).collect();
        assert_eq!(names, vec!["Work"]);
    }

    #[test]
    fn remove_phase_checks_name() {
        let mut s = Scenario::new("S");
        s.push_phase(Arc::new(phase("A", 1.0)));
        assert!(matches!(s.remove_phase(0, "B"), Err(ModelError::PhaseMismatch { index: 0, .. })));
        assert_eq!(s.remove_phase(0, "A").unwrap().name(), "A");
        assert!(s.phases.is_empty());
    }

    #[test]
    fn sort_phases_keeps_system_first() {
        let mut s = Scenario::new("S");
        for name in ["A", "!Sys", "B", "C"] {
            s.push_phase(Arc::new(phase(name, 1.0)));
        }
        let order: BTreeMap<usize, String> =
            [(3, "C"), (0, "A"), (2, "B")].into_iter().map(|(i, n)| (i, n.to_string())).collect();
        s.sort_phases(&order).unwrap();
        let names: Vec<&str> = s.phases.iter().map(PhaseRef::name).collect();
        assert_eq!(names, vec!["!Sys", "A", "B", "C"]);

        let bad: BTreeMap<usize, String> = [(0, "A".to_string())].into_iter().collect();
        assert!(s.sort_phases(&bad).is_err());
        assert_eq!(s.phases.len(), 4);
    }

    #[test]
    fn duration_aggregates_clamped_phases() {
        let mut s = Scenario::new("S");
        assert_eq!(s.duration(), TimeDistribution::ZERO);
        s.push_phase(Arc::new(phase("A", 2.0)));
        s.push_phase(Arc::new(phase("B", 24.0 * 100.0)));
        let d = s.duration();
        assert_eq!(d.mode(), SimTime::hours(2.0) + ARBITRARY_MAX_DURATION);
    }

    #[test]
    fn scenario_errors() {
        let mut s = Scenario::new("S");
        assert_eq!(s.error_message().unwrap(), "A scenario must have at least one phase!");
        let mut p = phase("Bad", 1.0);
        p.phase_type = TypeCode::NONE;
        s.push_phase(Arc::new(p)).id = PhaseId(1);
        assert!(s.error_message().unwrap().starts_with("Invalid phase “1.Bad”"));
    }
}

// ── DataSet ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod dataset_tests {
    use super::*;
    use tracing_test::traced_test;

    fn data() -> DataSet {
        let mut clean = task(1, "Clean");
        clean.auto_expand = true;
        let mut inspect = task(2, "Inspect");
        inspect.auto_expand = true;
        let mut watch = task(3, "Watch");
        watch.phase_types.push(TypeCode(1));
        DataSetBuilder::new("Ship")
            .task(clean)
            .task(inspect)
            .task(watch)
            .task(task(4, "Unused"))
            .relation(TaskId(1), RelationKind::Parallel, TaskId(3))
            .crewman(Crewman::new(CrewmanId(1), "Alice").with_qualification(TaskId(3), 100))
            .crewman(Crewman::new(CrewmanId(2), "Bob").with_qualification(TaskId(3), 60))
            .phase(phase("Transit", 4.0).with_task(TaskRef::new(TaskId(1))))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_starts_from_the_named_workplace() {
        let d = data();
        assert_eq!(d.workplace.name, "Ship");
        assert!(d.expanded_tasks().is_empty());
        assert_eq!(DataSet::with_workplace(Workplace::new("Rig")).workplace.to_string(), "Rig");
    }

    #[test]
    fn auto_expand_creates_one_copy_per_crewman() {
        let mut d = data();
        d.auto_expand_tasks().unwrap();
        let ex = d.expanded_tasks();
        let ids: Vec<i32> = ex.ids().map(|t| t.0).collect();
        assert_eq!(ids, vec![3, 4, 5000, 5001, 5050, 5051]);
        assert_eq!(ex.get(TaskId(5001)).unwrap().name, "Clean | 1-02.Bob");
        assert_eq!(d.crew.get(CrewmanId(2)).unwrap().qualification(TaskId(5001)), 100);
        assert_eq!(d.crew.get(CrewmanId(2)).unwrap().qualification(TaskId(5000)), 0);
        assert!(d.tasks.contains(TaskId(1)));
    }

    #[test]
    fn auto_expand_copies_relations_and_phase_refs() {
        let mut d = data();
        d.auto_expand_tasks().unwrap();
        let ex = d.expanded_tasks();
        assert_eq!(ids(ex.get(TaskId(3)).unwrap().parallels()), vec![5000, 5001]);
        assert_eq!(ids(ex.get(TaskId(5000)).unwrap().parallels()), vec![3, 5001]);
        // The base table keeps its own relations.
        assert_eq!(ids(d.tasks.get(TaskId(3)).unwrap().parallels()), vec![1]);
        let p = &d.scenario.phases[0];
        assert!(p.contains_task(TaskId(5000)) && p.contains_task(TaskId(5001)));
        assert!(!p.contains_task(TaskId(5050)));
        assert!(!p.origin().tasks.contains_key(&TaskId(5000)));
    }

    #[test]
    fn clean_undoes_expansion() {
        let mut d = data();
        d.auto_expand_tasks().unwrap();
        d.clean_auto_expanded_tasks();
        assert!(d.expanded_tasks().is_empty());
        assert_eq!(d.crew.get(CrewmanId(1)).unwrap().qualifications.len(), 1);
        assert!(!d.scenario.phases[0].contains_task(TaskId(5000)));
    }

    #[test]
    fn prepare_numbers_phases_and_caches_qualifications() {
        let mut d = data();
        d.auto_expand_tasks().unwrap();
        d.prepare_for_first_simulation();
        assert_eq!(d.scenario.phases[0].id, PhaseId(1));
        assert_eq!(d.qualified_crew(TaskId(3)), &[(CrewmanId(1), 100), (CrewmanId(2), 60)]);
        assert_eq!(d.qualified_crew(TaskId(5000)), &[(CrewmanId(1), 100)]);
        assert!(d.qualified_crew(TaskId(4)).is_empty());
    }

    #[test]
    #[traced_test]
    fn unknown_qualification_is_logged() {
        let mut d = data();
        d.crew.get_mut(CrewmanId(1)).unwrap().qualifications.insert(TaskId(77), 50);
        d.auto_expand_tasks().unwrap();
        d.prepare_for_first_simulation();
        assert!(logs_contain("qualification for an unknown task"));
    }

    #[test]
    fn diagnostics() {
        let mut d = data();
        d.auto_expand_tasks().unwrap();
        let msg = d.error_message().unwrap();
        assert!(msg.starts_with("✗ Some of the tasks are not assigned to enough crew-members!"), "{msg}");
        assert!(msg.contains("4.Unused"));
        assert_eq!(d.warning_message().unwrap(), "The following tasks are not used: 2.Inspect; 4.Unused; ");
        assert!(d.task_is_used(d.tasks.get(TaskId(1)).unwrap()));
    }

    #[test]
    fn constructors_customize_created_records() {
        let mut d = DataSet::default().with_constructors(
            Constructors::default()
                .with_task(|id, name| {
                    let mut t = Task::new(id, name);
                    t.priority = 42;
                    t
                })
                .with_phase_loader(|name| Some(phase(name, 1.0))),
        );
        let id = d.create_task("Made").unwrap();
        assert_eq!(d.tasks.get(id).unwrap().priority, 42);
        assert_eq!(d.create_crewman("Carl"), CrewmanId(1));
        d.add_phase("Loaded").unwrap();
        assert_eq!(d.scenario.phases[0].name(), "Loaded");
    }
}
