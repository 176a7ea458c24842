//! One replication: the event loop and everything an event can trigger.
//!
//! # Per-phase loop
//!
//! ```text
//! for phase in scenario:
//!   ① sample the phase duration
//!   ② transition: every pending event is killed or carried over
//!   ③ drain stop events left at the transition time
//!   ④ add the phase-duration occurrence (obligatory, ends the phase)
//!   ⑤ enqueue phase-dependent tasks (by type, then phase-specific)
//!   ⑥ consume events while an obligatory occurrence is pending
//!   ⑦ drain stop events at the current time
//! final transition to no phase
//! ```
//!
//! All mutation goes through [`Replication`], which borrows the data set and
//! the engine state for the duration of one run and also serves as the
//! [`AssignmentContext`] handed to the dispatcher.

use std::sync::Arc;

use cs_core::{CrewmanId, OccurrenceId, SimRng, SimTime, TaskId, TimeDistribution, TimeUnit, TypeCode};
use cs_dispatch::{AssignmentContext, DispatchError, DispatchResult, Dispatcher};
use cs_model::{
    ARBITRARY_MAX_DURATION, Crewman, DataSet, PhaseInterruptionPolicy, RelativeDateType,
    RelativeTimeType, ScenarioInterruptionPolicy, SimPhase, StandardTaskType, Task,
    TaskDuplicatesPolicy, TaskInterruptionPolicy, TaskOccurrence,
};
use cs_schedule::{EventSubtype, TaskEvent, TaskRank};
use tracing::{debug, trace, warn};

use crate::SimObserver;
use crate::sim::{EngineState, TaskIdSet};

/// Events consumed between two checks of the phase-length cap.
const SAFETY_CHECK_INTERVAL: u32 = 256;

/// Draws allowed to place the first occurrence of a task chained to its
/// previous start.
const FIRST_START_ATTEMPTS: u32 = 8;

/// Sunday skips tried before a start time is accepted as is.
const MAX_CALENDAR_SHIFTS: u32 = 8;

pub(crate) struct Replication<'a> {
    pub data:       &'a mut DataSet,
    pub st:         &'a mut EngineState,
    pub dispatcher: &'a dyn Dispatcher,
    pub observer:   &'a mut dyn SimObserver,
    pub rng:        &'a mut SimRng,
}

impl Replication<'_> {
    // ── Run ───────────────────────────────────────────────────────────────

    pub fn run(&mut self, origin: SimTime) -> DispatchResult<bool> {
        self.st.now = origin;
        let mut limit = origin;
        self.prepare_for_next_replication()?;
        debug!(data_set = %self.data, time = %origin, "replication starts");

        let mut previous = None;
        for index in 0..self.st.phases.len() {
            let length = self.st.phases[index].duration.next_value(self.rng);
            debug!(time = %self.st.now, phase = %self.st.phases[index], duration = %length, "phase begins");
            self.do_phase_transition(previous, Some(index))?;
            self.drain_stop_events(limit)?;

            let begin = self.st.now;
            self.st.phase = Some(index);
            self.st.phases[index].begin = begin;
            if length.is_positive() {
                self.add_duration_task(index, length);
            }
            self.enqueue_phase_tasks(index)?;

            let mut consumed: u32 = 0;
            while let Some(&next) = self.st.queue.peek() {
                if self.st.obligatory == 0 {
                    break;
                }
                if next.time >= SimTime::MAX {
                    warn!(phase = %self.st.phases[index], "obligatory occurrences wait for another phase");
                    break;
                }
                consumed = consumed.wrapping_add(1);
                if consumed % SAFETY_CHECK_INTERVAL == 0 && self.st.now - begin > ARBITRARY_MAX_DURATION {
                    warn!(phase = %self.st.phases[index], time = %self.st.now, "phase exceeds the maximum duration");
                    break;
                }
                if let Some(event) = self.st.queue.pop() {
                    self.consume_event(event)?;
                }
            }
            debug_assert!(
                self.st.queue.peek().is_none_or(|e| e.time >= self.st.now),
                "events left in the past"
            );
            limit = self.st.now;
            self.drain_stop_events(limit)?;
            previous = Some(index);
        }

        debug!(time = %self.st.now, insertions = self.st.insertions, "scenario ends");
        self.do_phase_transition(previous, None)?;
        self.st.phase = None;
        self.release_dangling_assignments()?;
        self.observer.on_replication_end(self.st.now, &self.data.crew);
        Ok(!self.st.data_error)
    }

    fn prepare_for_next_replication(&mut self) -> DispatchResult<()> {
        self.st.active.clear();
        self.st.queue.clear();
        self.st.asap.clear();
        self.st.occurrences.clear();
        self.st.insertions = 0;
        self.st.obligatory = 0;
        self.st.phase = None;
        self.st.data_error = false;
        self.data.prepare_for_next_replication();

        if let Some(message) = self.data.error_message() {
            warn!(%message, "data set errors");
            self.st.data_error = true;
            self.observer.on_error_message(&message);
        }
        if let Some(message) = self.data.warning_message() {
            warn!(%message, "data set warnings");
            self.observer.on_error_message(&message);
        }

        self.st.tasks.clear();
        let mut invalid = Vec::new();
        for task in self.data.expanded_tasks().iter() {
            let mut task = task.clone();
            if task.enabled {
                if !task.is_valid() {
                    task.enabled = false;
                    invalid.push(task.id);
                } else if task.date_offset.unit() != TimeUnit::Undefined {
                    task.date_offset.next_value(self.rng);
                }
            }
            self.st.tasks.insert(task.id, Arc::new(task));
        }
        for id in invalid {
            if let Some(task) = self.data.expanded_tasks_mut().get_mut(id) {
                task.enabled = false;
            }
            if let Some(task) = self.st.tasks.get(&id).cloned() {
                self.report_task_error(None, &task);
            }
        }

        let expanded = self.data.expanded_tasks();
        self.st.phases = self.data.scenario.phases.iter().map(|p| p.to_sim_phase(expanded)).collect();

        let starters: Vec<Arc<Task>> = self
            .st
            .tasks
            .values()
            .filter(|t| t.enabled && !t.auto_expand && !t.is_phase_dependent() && !t.is_triggered())
            .cloned()
            .collect();
        for task in starters {
            let now = self.st.now;
            let sub_code = task.task_type.sub_code(1);
            let automatic = task.date_offset.unit() == TimeUnit::Undefined
                && (sub_code == StandardTaskType::ExternalCondition.code().0
                    || sub_code == StandardTaskType::CriticalEvents.code().0);
            let time = if automatic {
                let mut start = task.start_date;
                now + start.next_value(self.rng) / 2.0
            } else {
                now
            };
            let occurrence = self.new_occurrence(task);
            self.enqueue_task_arrival(occurrence, time, true)?;
        }
        Ok(())
    }

    /// An obligatory occurrence lasting as long as the phase.
    fn add_duration_task(&mut self, index: usize, length: SimTime) {
        let phase = &self.st.phases[index];
        let mut task = Task::new(
            TaskId::phase_duration(phase.id),
            format!("!Duration task for phase {} ({})", phase.id.0, phase.name),
        );
        task.task_type = StandardTaskType::InternalWait.code();
        task.task_interruption = TaskInterruptionPolicy::DropWithError;
        task.phase_interruption = PhaseInterruptionPolicy::Obligatory;
        task.scenario_interruption = ScenarioInterruptionPolicy::DropWithError;
        task.relative_date = RelativeDateType::RelativeStartFromStartOfPhase;
        task.start_date = TimeDistribution::ZERO;
        task.date_offset = TimeDistribution::ZERO;
        task.duration = phase.duration;
        task.on_holidays = true;
        task.crew_needed = 0;

        let now = self.st.now;
        let occurrence = self.new_occurrence(Arc::new(task));
        let occ = self.occ_mut(occurrence);
        occ.set_arrives(now);
        occ.prepare_for_next_occurrence();
        self.st.obligatory += 1;
        self.schedule(occurrence, now + length.min(ARBITRARY_MAX_DURATION), EventSubtype::Ends);
    }

    fn enqueue_phase_tasks(&mut self, index: usize) -> DispatchResult<()> {
        let phase = &self.st.phases[index];
        let by_type: Vec<Arc<Task>> = self
            .st
            .tasks
            .values()
            .filter(|t| t.is_phase_dependent() && !t.auto_expand && t.enabled && t.allowed_in(phase.phase_type))
            .cloned()
            .collect();
        let specific: Vec<Arc<Task>> = phase
            .tasks
            .iter()
            .filter(|t| t.is_phase_dependent() && !t.auto_expand && t.enabled)
            .cloned()
            .collect();
        let now = self.st.now;
        for task in by_type.into_iter().chain(specific) {
            let occurrence = self.new_occurrence(task);
            self.enqueue_task_arrival(occurrence, now, true)?;
        }
        Ok(())
    }

    fn drain_stop_events(&mut self, limit: SimTime) -> DispatchResult<()> {
        while let Some(&next) = self.st.queue.peek() {
            if next.time > limit || !next.subtype.is_stop() {
                break;
            }
            if let Some(event) = self.st.queue.pop() {
                self.consume_event(event)?;
            }
        }
        Ok(())
    }

    fn release_dangling_assignments(&mut self) -> DispatchResult<()> {
        let now = self.st.now;
        let dangling: Vec<CrewmanId> =
            self.data.crew.iter().filter(|c| !c.is_idle()).map(|c| c.id).collect();
        debug_assert!(dangling.is_empty(), "crew still assigned at the end of the scenario: {dangling:?}");
        for id in dangling {
            warn!(crewman = %id, "still assigned at the end of the scenario");
            self.dismiss_all(id)?;
        }
        self.data.crew.refresh_all(now);
        Ok(())
    }

    // ── Arena and queue helpers ───────────────────────────────────────────

    #[inline]
    fn occ(&self, id: OccurrenceId) -> &TaskOccurrence {
        &self.st.occurrences[id.index()]
    }

    #[inline]
    fn occ_mut(&mut self, id: OccurrenceId) -> &mut TaskOccurrence {
        &mut self.st.occurrences[id.index()]
    }

    #[inline]
    fn task_of(&self, id: OccurrenceId) -> Arc<Task> {
        self.occ(id).task_arc().clone()
    }

    fn new_occurrence(&mut self, task: Arc<Task>) -> OccurrenceId {
        let id = OccurrenceId(self.st.occurrences.len() as u32);
        self.st.occurrences.push(TaskOccurrence::new(id, task));
        id
    }

    fn rank(&self, occurrence: OccurrenceId) -> TaskRank {
        let occ = self.occ(occurrence);
        let task = occ.task();
        TaskRank {
            priority:       task.priority,
            crew_needed:    task.crew_needed,
            parallel_count: task.parallels().len() as u32,
            task_id:        task.id,
            arrives:        occ.arrives(),
        }
    }

    /// Push onto the main queue, refreshing the cached rank.
    fn add_event(&mut self, mut event: TaskEvent) {
        event.rank = self.rank(event.occurrence);
        debug_assert!(
            event.subtype != EventSubtype::WorkContinues
                || event.time >= SimTime::MAX
                || self.occ(event.occurrence).is_allowed_time(event.time),
            "{event} outside the allowed hours of its task"
        );
        self.st.insertions += 1;
        self.st.queue.push(event);
    }

    fn schedule(&mut self, occurrence: OccurrenceId, time: SimTime, subtype: EventSubtype) {
        self.add_event(TaskEvent::new(occurrence, TaskRank::default(), time, subtype));
    }

    fn add_asap(&mut self, mut event: TaskEvent) {
        event.rank = self.rank(event.occurrence);
        self.st.asap.push(event);
    }

    fn report_task_error(&mut self, phase: Option<usize>, task: &Task) {
        debug!(time = %self.st.now, task = %task, "task error");
        let st = &*self.st;
        self.observer.on_task_error(st.now, phase.map(|i| &st.phases[i]), task);
    }

    // ── Arrival scheduling ────────────────────────────────────────────────

    /// Sample a fresh occurrence and plan its start from `event_time`
    /// according to the task's recurrence.
    fn enqueue_task_arrival(
        &mut self,
        occurrence: OccurrenceId,
        event_time: SimTime,
        original:   bool,
    ) -> DispatchResult<()> {
        {
            let occ = &mut self.st.occurrences[occurrence.index()];
            occ.sample(self.rng);
            occ.prepare_for_next_occurrence();
        }
        let task = self.task_of(occurrence);
        if task.crew_needed as usize > self.data.qualified_crew(task.id).len() {
            if task.is_obligatory() {
                self.st.obligatory += 1;
            }
            self.schedule(occurrence, event_time, EventSubtype::Killed);
            self.report_task_error(self.st.phase, &task);
            return Ok(());
        }

        let (start, offset, duration) = {
            let occ = self.occ(occurrence);
            (occ.start_date.x_value(), occ.date_offset.x_value(), occ.duration.x_value())
        };
        let (begin, length) = {
            let phase = self.st.phase_or_outside();
            (phase.begin, phase.duration.x_value())
        };
        let mut carried = false;
        let mut next = match task.relative_date {
            RelativeDateType::AbsoluteStartMonthDay => event_time.next_month_time(start, true) + offset,
            RelativeDateType::AbsoluteStartWeekDay => event_time.next_week_time(start, true) + offset,
            RelativeDateType::Frequency => {
                if original {
                    event_time + offset
                } else {
                    event_time
                }
            }
            RelativeDateType::RelativeStartFromPreviousStart => {
                let (next, from_previous_phase) = self.chain_to_previous_start(occurrence, event_time)?;
                carried = from_previous_phase;
                next
            }
            RelativeDateType::RelativeStartFromStartOfPhase => begin + start,
            RelativeDateType::RelativeStartFromEndOfPhase => begin + length - start,
            RelativeDateType::RelativeStopFromEndOfPhase => begin,
            _ => event_time + offset,
        };
        if next < event_time {
            next = event_time;
        }
        let next = find_start_time(&task, duration, event_time, next);

        if task.is_obligatory() {
            self.st.obligatory += 1;
        }
        let subtype = if carried { EventSubtype::Resumes } else { EventSubtype::Planned };
        trace!(task = %task, time = %next, %subtype, "enqueued");
        self.schedule(occurrence, next, subtype);
        Ok(())
    }

    /// Start time of an occurrence chained to the previous start of its task.
    ///
    /// A fresh occurrence takes over a pending one of the same task: a
    /// planned one gives its arrival as the reference, a running one hands
    /// over its progress and the new occurrence resumes immediately (the
    /// returned flag).
    fn chain_to_previous_start(
        &mut self,
        occurrence: OccurrenceId,
        event_time: SimTime,
    ) -> DispatchResult<(SimTime, bool)> {
        let now = self.st.now;
        let task_id = self.occ(occurrence).task_id();
        let mut carried = false;
        if self.occ(occurrence).arrives().is_negative() {
            let found = self
                .st
                .queue
                .find_index(|e| e.task_id() == task_id && e.occurrence != occurrence);
            if let Some(i) = found {
                let previous = self.st.queue.remove_at(i);
                trace!(event = %previous, "replaced");
                if previous.subtype == EventSubtype::Planned {
                    let prev = self.occ(previous.occurrence);
                    let reference = prev.arrives() - prev.start_date.x_value();
                    self.occ_mut(occurrence).set_arrives(reference);
                } else {
                    carried = true;
                    let prev = self.occ_mut(previous.occurrence);
                    prev.process_until_now(now);
                    let (arrives, remaining) = (prev.arrives(), prev.remaining());
                    let occ = self.occ_mut(occurrence);
                    occ.set_arrives(arrives);
                    occ.set_remaining(remaining);
                    occ.sleep_until_now(now);
                }
                let dispatcher = self.dispatcher;
                dispatcher.task_dismiss(previous.occurrence, self)?;
                self.schedule(previous.occurrence, now, EventSubtype::Cancelled);
            }
        }

        let arrives = self.occ(occurrence).arrives();
        let next = if arrives.is_negative() {
            let occ = &mut self.st.occurrences[occurrence.index()];
            let mut next = event_time - occ.start_date.x_value();
            let mut attempts = FIRST_START_ATTEMPTS;
            while next < event_time {
                attempts -= 1;
                if attempts == 0 {
                    break;
                }
                next += occ.start_date.next_value(self.rng);
            }
            next
        } else if carried {
            now
        } else {
            arrives + self.occ(occurrence).start_date.x_value()
        };
        Ok((next, carried))
    }

    // ── Event consumption ─────────────────────────────────────────────────

    fn consume_event(&mut self, mut event: TaskEvent) -> DispatchResult<()> {
        self.st.now = event.time;
        let now = event.time;
        let occurrence = event.occurrence;
        let task = self.task_of(occurrence);
        trace!(%event, remaining = %self.occ(occurrence).remaining(), "consume");

        let mut dismiss = false;
        match event.subtype {
            EventSubtype::Planned => {
                if task.needs_duplicate_management()
                    && self.st.active.contains(&task.id)
                    && self.consume_duplicate(event, &task)?
                {
                    return Ok(());
                }
                self.consume_planned(event, &task)?;
            }
            EventSubtype::Adjourned => {
                self.occ_mut(occurrence).process_until_now(now);
                dismiss = true;
                event.time = self.occ(occurrence).next_possible_resume(now, false);
                event.subtype = EventSubtype::Resumes;
                self.add_event(event);
            }
            EventSubtype::Hibernated => {
                self.occ_mut(occurrence).process_until_now(now);
                self.st.active.remove(&task.id);
                dismiss = true;
                event.time = SimTime::MAX;
                event.subtype = EventSubtype::Awakes;
                if !task.slaves().is_empty() {
                    self.stop_slaves(task.id);
                }
                self.add_event(event);
            }
            EventSubtype::WorkInterrupted => {
                self.occ_mut(occurrence).process_until_now(now);
                dismiss = true;
                event.subtype = EventSubtype::WorkContinues;
                event.time = self.occ(occurrence).next_possible_resume(now, true);
                self.add_event(event);
            }
            EventSubtype::Awakes => {
                self.st.active.insert(task.id);
                self.start_slaves(&task, event.time)?;
                self.resume_task(event, &task)?;
            }
            EventSubtype::Resumes | EventSubtype::WorkContinues => {
                self.resume_task(event, &task)?;
            }
            EventSubtype::Ends | EventSubtype::Killed => {
                dismiss = true;
                self.consume_killed(event, &task)?;
            }
            _ => {
                if task.is_obligatory() {
                    self.st.obligatory = self.st.obligatory.saturating_sub(1);
                }
            }
        }

        let occ = self.occ(occurrence);
        debug_assert!(!occ.remaining().is_negative(), "{occ} has a negative remaining duration");
        if dismiss && (occ.is_staffed() || !occ.assigned.is_empty()) {
            let freed = occ.assigned.clone();
            let dispatcher = self.dispatcher;
            dispatcher.task_dismiss(occurrence, self)?;
            self.restore_asap(freed);
        }
        Ok(())
    }

    /// Resolve an arriving occurrence whose task is already active.  Returns
    /// `false` when no other occurrence was found after all.
    fn consume_duplicate(&mut self, mut event: TaskEvent, task: &Task) -> DispatchResult<bool> {
        let now = self.st.now;
        if task.duplicates == TaskDuplicatesPolicy::RejectNewDuplicates {
            trace!(%event, "duplicate rejected");
            event.subtype = EventSubtype::Cancelled;
            event.time = now;
            self.consume_event(event)?;
            return Ok(true);
        }

        let found = if let Some(i) = self.st.asap.rposition_task(task.id) {
            Some(self.st.asap.remove(i))
        } else {
            self.st
                .queue
                .find_index(|e| e.task_id() == task.id)
                .map(|i| self.st.queue.remove_at(i))
        };
        let Some(mut duplicate) = found else {
            return Ok(false);
        };

        let old = self.occ_mut(duplicate.occurrence);
        if duplicate.subtype.is_start() {
            old.sleep_until_now(now);
        } else {
            old.process_until_now(now);
        }
        let leftover = old.remaining();
        duplicate.time = now;
        duplicate.subtype = EventSubtype::Killed;
        if matches!(task.duplicates, TaskDuplicatesPolicy::Undefined | TaskDuplicatesPolicy::MergeDuplicates) {
            trace!(%event, %leftover, "merging with the active occurrence");
            let occ = self.occ_mut(event.occurrence);
            let merged = occ.remaining() + leftover;
            occ.set_remaining(merged);
        }
        self.consume_event(duplicate)?;
        self.consume_event(event)?;
        Ok(true)
    }

    fn consume_planned(&mut self, mut event: TaskEvent, task: &Arc<Task>) -> DispatchResult<()> {
        let occurrence = event.occurrence;
        let arrival = event.time;
        event.subtype = EventSubtype::Arrives;
        self.occ_mut(occurrence).set_arrives(arrival);

        if !task.is_phase_dependent() && !task.is_triggered() {
            let phase_type = self.st.phase_or_outside().phase_type;
            if task.allowed_in(phase_type) {
                if task.relative_date == RelativeDateType::Frequency {
                    self.plan_next_frequency(occurrence, task, arrival)?;
                }
            } else {
                if task.relative_date == RelativeDateType::Frequency
                    && task.date_offset.unit() != TimeUnit::Undefined
                {
                    // The period has its own offset: skip this one.
                    let step = self.st.occurrences[occurrence.index()].start_date.next_value(self.rng);
                    event.subtype = EventSubtype::Planned;
                    event.time = arrival + step;
                } else {
                    event.subtype = EventSubtype::ForNextPhase;
                    event.time = SimTime::MAX;
                }
                trace!(%event, "not allowed in this phase");
                self.add_event(event);
                return Ok(());
            }
        }

        self.start_slaves(task, event.time)?;
        self.st.active.insert(task.id);
        self.resume_task(event, task)
    }

    /// Enqueue the occurrence following `current` of a periodic task.
    ///
    /// When the task has a daily window and `current` did not arrive at its
    /// opening, the next one is pulled back to the opening and `current` is
    /// backdated so that the part of the window already gone counts as done.
    fn plan_next_frequency(
        &mut self,
        current: OccurrenceId,
        task:    &Arc<Task>,
        arrival: SimTime,
    ) -> DispatchResult<()> {
        let next = self.new_occurrence(task.clone());
        let step = self.st.occurrences[next.index()].start_date.next_value(self.rng);
        let mut next_time = arrival + step;
        if task.relative_time != RelativeTimeType::AbsoluteStartTime
            && task.daily_hour_start != task.daily_hour_end
        {
            let opening = task.daily_hour_start + self.occ(next).date_offset.x_value();
            let offset = SimTime::day_time_offset(opening, arrival);
            if offset.is_positive() && offset < step {
                next_time -= offset;
                let window = SimTime::day_time_offset(task.daily_hour_start, task.daily_hour_end);
                let shift = window - self.occ(current).duration.x_value();
                if shift.is_positive() && shift < offset {
                    let occ = self.occ_mut(current);
                    let backdated = occ.arrives() - (offset - shift);
                    occ.set_arrives(backdated);
                    occ.discard_until_now(arrival);
                }
            }
        }
        let resume = self.occ(next).next_possible_resume(next_time, true);
        self.enqueue_task_arrival(next, resume, false)
    }

    fn start_slaves(&mut self, task: &Task, time: SimTime) -> DispatchResult<()> {
        for slave in task.slaves() {
            let Some(definition) = self.st.tasks.get(slave).filter(|t| t.enabled).cloned() else {
                continue;
            };
            let occurrence = self.new_occurrence(definition);
            self.enqueue_task_arrival(occurrence, time, true)?;
        }
        Ok(())
    }

    /// Ask the dispatcher for crew and plan the next stop of the occurrence:
    /// completion, assignment expiry, rotation, end of the daily window, or
    /// Sunday, whichever comes first.
    fn resume_task(&mut self, mut event: TaskEvent, task: &Task) -> DispatchResult<()> {
        let occurrence = event.occurrence;
        self.occ_mut(occurrence).sleep_until_now(event.time);
        let dispatcher = self.dispatcher;
        let expiry = dispatcher.task_assignment(occurrence, self)?;
        if expiry.is_negative() {
            trace!(%event, "not staffed");
            return self.interrupt_task(event, false, true);
        }

        let remaining = self.occ(occurrence).remaining();
        let completion = event.time + remaining;
        let mut interruption = expiry;
        event.subtype = EventSubtype::WorkInterrupted;
        if task.rotation.is_positive() && remaining > task.rotation {
            interruption = interruption.min(event.time + task.rotation);
        }
        if task.daily_hour_start != task.daily_hour_end {
            let closing = event.time.next_day_time(task.daily_hour_end, false);
            if interruption > closing {
                interruption = closing;
                event.subtype = EventSubtype::Adjourned;
            }
        }
        if !task.on_holidays {
            let sunday = event.time.next_week_time(SimTime::ONE_WEEK, true);
            if interruption > sunday {
                interruption = sunday;
                event.subtype = EventSubtype::Adjourned;
            }
        }

        if interruption >= completion {
            event.subtype = EventSubtype::Ends;
            event.time = completion;
        } else {
            if task.phase_interruption == PhaseInterruptionPolicy::DoNotInterrupt
                && event.subtype == EventSubtype::Adjourned
            {
                event.subtype = EventSubtype::Ends;
                if task.relative_date == RelativeDateType::RelativeStartFromPreviousStart {
                    // Later occurrences start at the opening of the window.
                    let occ = self.occ_mut(occurrence);
                    let late = occ.arrives().day_time() - task.daily_hour_start;
                    if late.is_positive() {
                        let arrives = occ.arrives() - late;
                        occ.set_arrives(arrives);
                    }
                }
            }
            event.time = interruption;
        }
        self.add_event(event);
        Ok(())
    }

    /// Stop a pending occurrence so its crew can go elsewhere.
    fn interrupt_task(&mut self, mut event: TaskEvent, try_again_now: bool, recursive: bool) -> DispatchResult<()> {
        let now = self.st.now;
        let occurrence = event.occurrence;
        let task = self.task_of(occurrence);
        self.occ_mut(occurrence).process_until_now(now);

        let drop = match task.task_interruption {
            TaskInterruptionPolicy::DropWithError | TaskInterruptionPolicy::DropWithoutError => true,
            TaskInterruptionPolicy::ContinueOrDropWithError
            | TaskInterruptionPolicy::ContinueOrDropWithoutError => !try_again_now,
            _ => false,
        };
        if drop {
            event.subtype = EventSubtype::Killed;
            event.time = now;
            if matches!(
                task.task_interruption,
                TaskInterruptionPolicy::DropWithError | TaskInterruptionPolicy::ContinueOrDropWithError
            ) {
                self.report_task_error(self.st.phase, &task);
            }
        } else {
            if task.task_interruption == TaskInterruptionPolicy::ContinueOrResumeWithError {
                self.report_task_error(self.st.phase, &task);
            }
            event.subtype = EventSubtype::WorkContinues;
            event.time = self.occ(occurrence).next_possible_resume(now, true);
        }
        trace!(%event, remaining = %self.occ(occurrence).remaining(), "interrupted");

        let dispatcher = self.dispatcher;
        dispatcher.task_dismiss(occurrence, self)?;
        if recursive {
            for parallel in task.parallels() {
                let found = self.st.queue.find_index(|e| e.task_id() == *parallel);
                if let Some(i) = found {
                    let pending = self.st.queue.remove_at(i);
                    self.interrupt_task(pending, false, false)?;
                }
            }
        }
        if event.subtype == EventSubtype::WorkContinues {
            self.add_asap(event);
        } else {
            self.add_event(event);
        }
        Ok(())
    }

    /// End or kill an occurrence: cascade to slaves and parallels, report an
    /// unfinished end, and chain the next occurrence where the recurrence
    /// requires it.
    fn consume_killed(&mut self, event: TaskEvent, task: &Task) -> DispatchResult<()> {
        let time = event.time;
        self.occ_mut(event.occurrence).process_until_now(time);
        self.st.active.remove(&task.id);
        if task.is_obligatory() {
            self.st.obligatory = self.st.obligatory.saturating_sub(1);
        }
        if !task.slaves().is_empty() {
            self.stop_slaves(task.id);
        }
        for parallel in task.parallels() {
            let Some(i) = self.st.queue.find_index(|e| e.task_id() == *parallel) else {
                continue;
            };
            let Some(&pending) = self.st.queue.get(i) else {
                continue;
            };
            if pending.subtype.is_not_started() {
                continue;
            }
            let occ = self.occ_mut(pending.occurrence);
            occ.process_until_now(time);
            if occ.remaining().is_positive() {
                let mut pending = self.st.queue.remove_at(i);
                pending.subtype = EventSubtype::Killed;
                pending.time = time;
                self.consume_event(pending)?;
            }
        }

        if event.subtype == EventSubtype::Ends {
            if self.occ(event.occurrence).remaining().is_positive()
                && matches!(
                    task.task_interruption,
                    TaskInterruptionPolicy::DropWithError | TaskInterruptionPolicy::ContinueOrDropWithError
                )
            {
                self.report_task_error(self.st.phase, task);
            }
            if matches!(
                task.relative_date,
                RelativeDateType::AbsoluteStartMonthDay
                    | RelativeDateType::AbsoluteStartWeekDay
                    | RelativeDateType::RelativeStartFromPreviousStart
            ) {
                self.enqueue_task_arrival(event.occurrence, time, false)?;
            }
        }
        Ok(())
    }

    /// Kill every pending slave of `master` that has no other active master.
    fn stop_slaves(&mut self, master: TaskId) {
        let now = self.st.now;
        let st = &mut *self.st;
        let (occurrences, active) = (&st.occurrences, &st.active);
        let mut orphans = st
            .queue
            .remove_matching(|e| is_orphaned(occurrences[e.occurrence.index()].task(), master, active));
        let mut i = st.asap.len();
        while i > 0 {
            i -= 1;
            let Some(&event) = st.asap.get(i) else {
                continue;
            };
            if is_orphaned(occurrences[event.occurrence.index()].task(), master, active) {
                orphans.push(st.asap.remove(i));
            }
        }
        for mut event in orphans {
            event.time = now;
            event.subtype = EventSubtype::Killed;
            self.add_event(event);
        }
    }

    /// Move waiting occurrences back to the main queue after `freed` crew
    /// became available.  An empty `freed` wakes everything up.
    fn restore_asap(&mut self, mut freed: Vec<CrewmanId>) {
        let now = self.st.now;
        let everything = freed.is_empty();
        let mut i = self.st.asap.len();
        while i > 0 {
            i -= 1;
            let Some(&event) = self.st.asap.get(i) else {
                continue;
            };
            let task = self.occ(event.occurrence).task();
            let relevant = everything || task.crew_needed > 1 || !task.parallels().is_empty();
            let freed_index = if relevant {
                None
            } else {
                let qualified = self.data.qualified_crew(task.id);
                freed.iter().rposition(|c| qualified.iter().any(|(q, _)| q == c))
            };
            if !relevant && freed_index.is_none() {
                continue;
            }
            let mut event = self.st.asap.remove(i);
            event.time = self.occ(event.occurrence).next_possible_resume(now, true);
            if let Some(j) = freed_index {
                if event.time <= now {
                    freed.remove(j);
                }
            }
            self.add_event(event);
        }
    }

    // ── Phase transition ──────────────────────────────────────────────────

    /// Carry every pending occurrence from `previous` into `next`, or end
    /// them all when `next` is `None`.
    fn do_phase_transition(&mut self, previous: Option<usize>, next: Option<usize>) -> DispatchResult<()> {
        let now = self.st.now;
        {
            let st = &*self.st;
            self.observer.on_phase_transition_begin(
                now,
                previous.map(|i| &st.phases[i]),
                next.map(|i| &st.phases[i]),
            );
        }
        self.st.active.clear();
        self.st.obligatory = 0;

        let st = &mut *self.st;
        for event in st.asap.iter_mut() {
            event.time = st.occurrences[event.occurrence.index()].next_possible_resume(now, true);
        }
        let mut pending = st.asap.take_all();
        pending.extend(st.queue.take_all());

        let next_type = next.map(|i| self.st.phases[i].phase_type);
        let mut kept: Vec<TaskEvent> = Vec::with_capacity(pending.len());
        for k in 0..pending.len() {
            let mut event = pending[k];
            let occurrence = event.occurrence;
            let task = self.task_of(occurrence);
            let mut killed = true;
            let mut error = true;

            if event.subtype == EventSubtype::Planned {
                error = false;
                if let Some(phase_type) = next_type {
                    match task.relative_date {
                        RelativeDateType::Frequency
                        | RelativeDateType::AbsoluteStartWeekDay
                        | RelativeDateType::AbsoluteStartMonthDay => killed = false,
                        RelativeDateType::RelativeStartFromPreviousStart => {
                            if task.allowed_in(phase_type) && !kept.iter().any(|e| e.task_id() == task.id) {
                                killed = false;
                            }
                        }
                        _ => {}
                    }
                }
            } else if task.is_triggered() {
                // Slaves follow their masters.
                killed = false;
                self.occ_mut(occurrence).process_until_now(now);
                if next_type.is_none() {
                    error = task.scenario_interruption == ScenarioInterruptionPolicy::DropWithError;
                }
            } else if event.subtype == EventSubtype::ForNextPhase {
                error = false;
                if let Some(phase_type) = next_type {
                    killed = false;
                    if task.allowed_in(phase_type) {
                        event.subtype = EventSubtype::Planned;
                        event.time = self.occ(occurrence).next_possible_resume(now, true);
                    }
                }
            } else {
                self.carry_active_task(&mut event, &task, next_type, &mut killed, &mut error);
            }

            if killed || next_type.is_none() {
                if error {
                    self.report_task_error(previous, &task);
                } else {
                    trace!(%event, "dropped at phase change");
                }
                let dispatcher = self.dispatcher;
                dispatcher.task_dismiss(occurrence, self)?;
                if !task.slaves().is_empty() {
                    let (occurrences, active) = (&self.st.occurrences, &self.st.active);
                    for e in pending[k + 1..].iter_mut().chain(kept.iter_mut()) {
                        if is_orphaned(occurrences[e.occurrence.index()].task(), task.id, active) {
                            e.time = now;
                            e.subtype = EventSubtype::Killed;
                        }
                    }
                }
            } else {
                if task.is_obligatory() {
                    self.st.obligatory += 1;
                }
                if event.subtype != EventSubtype::Planned {
                    self.st.active.insert(task.id);
                }
                kept.push(event);
            }
        }

        self.st.asap.clear();
        self.st.queue.clear();
        self.st.queue.extend(kept);
        self.data.crew.refresh_all(now);

        let st = &*self.st;
        self.observer.on_phase_transition_end(
            now,
            previous.map(|i| &st.phases[i]),
            next.map(|i| &st.phases[i]),
        );
        Ok(())
    }

    /// Phase-interruption policy for a started occurrence.
    fn carry_active_task(
        &mut self,
        event:     &mut TaskEvent,
        task:      &Task,
        next_type: Option<TypeCode>,
        killed:    &mut bool,
        error:     &mut bool,
    ) {
        let now = self.st.now;
        let occurrence = event.occurrence;
        if event.subtype == EventSubtype::Awakes {
            let time = self.occ(occurrence).next_possible_resume(now, true);
            event.time = time;
            self.occ_mut(occurrence).sleep_until_now(time);
        } else if event.subtype.is_stop() {
            self.occ_mut(occurrence).process_until_now(now);
        }

        let scenario_error = task.scenario_interruption == ScenarioInterruptionPolicy::DropWithError;
        match task.phase_interruption {
            PhaseInterruptionPolicy::ResumeOrDropWithError | PhaseInterruptionPolicy::ResumeOrDropWithoutError => {
                match next_type {
                    None => *error = scenario_error,
                    Some(phase_type) => {
                        *killed = false;
                        if !task.allowed_in(phase_type) {
                            if event.subtype.is_start() {
                                self.occ_mut(occurrence).sleep_until_now(now);
                            }
                            event.subtype = EventSubtype::Hibernated;
                            event.time = now;
                        }
                    }
                }
            }
            PhaseInterruptionPolicy::ContinueOrDropWithError
            | PhaseInterruptionPolicy::ContinueOrDropWithoutError => {
                if task.phase_interruption == PhaseInterruptionPolicy::ContinueOrDropWithoutError {
                    *error = false;
                }
                match next_type {
                    None => *error = scenario_error,
                    Some(phase_type) => {
                        if task.allowed_in(phase_type) {
                            *killed = false;
                        }
                    }
                }
            }
            PhaseInterruptionPolicy::DropWithoutError | PhaseInterruptionPolicy::WholePhase => *error = false,
            _ => {}
        }
    }
}

// ── Free helpers ──────────────────────────────────────────────────────────────

/// `task` is a slave of `master` and of no other active task.
fn is_orphaned(task: &Task, master: TaskId, active: &TaskIdSet) -> bool {
    task.masters().contains(&master) && !task.masters().iter().any(|m| *m != master && active.contains(m))
}

/// Move `next` into the task's daily window and, unless the task runs on
/// holidays, past Sundays.
fn find_start_time(task: &Task, duration: SimTime, event_time: SimTime, mut next: SimTime) -> SimTime {
    for _ in 0..MAX_CALENDAR_SHIFTS {
        next = match task.relative_time {
            RelativeTimeType::AbsoluteStartTime => next.next_day_time(task.daily_hour_start, true),
            RelativeTimeType::AbsoluteStopTime => {
                let mut work_end = next.next_day_time(task.daily_hour_end, true);
                if work_end <= event_time {
                    work_end = next.next_day_time(task.daily_hour_end, false);
                }
                work_end - duration
            }
            _ => {
                let work_start = next.next_day_time(task.daily_hour_start, true);
                let work_end = next.next_day_time(task.daily_hour_end, true);
                if work_start < work_end || next >= work_end {
                    work_start
                } else {
                    next
                }
            }
        };
        if task.on_holidays || !next.is_sunday() {
            return next;
        }
        next = next.next_week_time(SimTime::ONE_DAY, false);
    }
    warn!(task = task.id.0, time = %next, "no allowed start time found, keeping last candidate");
    next
}

// ── AssignmentContext ─────────────────────────────────────────────────────────

impl AssignmentContext for Replication<'_> {
    fn now(&self) -> SimTime {
        self.st.now
    }

    fn phase(&self) -> &SimPhase {
        self.st.phase_or_outside()
    }

    fn occurrence(&self, id: OccurrenceId) -> Option<&TaskOccurrence> {
        self.st.occurrences.get(id.index())
    }

    fn crewman(&self, id: CrewmanId) -> Option<&Crewman> {
        self.data.crew.get(id)
    }

    fn qualified_crew(&self, task: TaskId) -> &[(CrewmanId, u8)] {
        self.data.qualified_crew(task)
    }

    fn refresh_crewman(&mut self, id: CrewmanId) {
        let now = self.st.now;
        if let Some(crewman) = self.data.crew.get_mut(id) {
            crewman.refresh_status(now);
        }
    }

    fn assign(&mut self, crewman: CrewmanId, occurrence: OccurrenceId) -> DispatchResult<()> {
        let now = self.st.now;
        let occ = self
            .st
            .occurrences
            .get_mut(occurrence.index())
            .ok_or(DispatchError::UnknownOccurrence(occurrence))?;
        if occ.assigned.contains(&crewman) {
            return Ok(());
        }
        let is_work = occ.task().is_work();
        self.data.crew.try_get_mut(crewman)?.assign_task(now, occurrence, is_work);
        occ.assigned.push(crewman);
        Ok(())
    }

    fn dismiss(&mut self, crewman: CrewmanId, occurrence: OccurrenceId) -> DispatchResult<()> {
        let now = self.st.now;
        let occ = self
            .st
            .occurrences
            .get_mut(occurrence.index())
            .ok_or(DispatchError::UnknownOccurrence(occurrence))?;
        let is_work = occ.task().is_work();
        self.data.crew.try_get_mut(crewman)?.dismiss_task(now, occurrence, is_work);
        occ.assigned.retain(|c| *c != crewman);
        Ok(())
    }

    fn dismiss_all(&mut self, crewman: CrewmanId) -> DispatchResult<()> {
        let now = self.st.now;
        let held = self.data.crew.try_get_mut(crewman)?.dismiss_all_tasks(now);
        for occurrence in held {
            if let Some(occ) = self.st.occurrences.get_mut(occurrence.index()) {
                occ.assigned.retain(|c| *c != crewman);
            }
        }
        Ok(())
    }

    fn interrupt(
        &mut self,
        occurrences:   &[OccurrenceId],
        try_again_now: bool,
        recursive:     bool,
    ) -> DispatchResult<()> {
        for &occurrence in occurrences {
            if let Some(i) = self.st.queue.find_index(|e| e.occurrence == occurrence) {
                let event = self.st.queue.remove_at(i);
                self.interrupt_task(event, try_again_now, recursive)?;
            }
        }
        Ok(())
    }

    fn notify_assignment(&mut self, crewman: Option<CrewmanId>, occurrence: Option<OccurrenceId>) {
        let (crew, st) = (&self.data.crew, &*self.st);
        let crewman = crewman.and_then(|id| crew.get(id));
        let occurrence = occurrence.and_then(|id| st.occurrences.get(id.index()));
        self.observer.on_task_assignment(st.now, st.current_phase(), crewman, occurrence);
    }
}
