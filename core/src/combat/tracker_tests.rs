//! Tests for CombatTracker turn order, health and store commands

use std::collections::HashSet;
use std::time::{Duration, Instant};

use skirmish_types::TrackerSettings;
use uuid::Uuid;

use super::{CombatError, CombatParticipant, CombatTracker, Condition, ParticipantUpdate};
use crate::signal_processor::CombatSignal;
use crate::sync::SyncCommand;
use crate::timers::{TimerEvent, TimerState};

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn tracker_with(settings: TrackerSettings, names: &[&str]) -> CombatTracker {
    let mut tracker = CombatTracker::new(settings);
    tracker
        .create_combat(Uuid::new_v4(), "Goblin Ambush", None)
        .unwrap();
    for (i, name) in names.iter().enumerate() {
        tracker
            .add_participant(CombatParticipant::npc(*name, 20 - i as i32).with_hp(10))
            .unwrap();
    }
    tracker
}

fn tracker(names: &[&str]) -> CombatTracker {
    tracker_with(TrackerSettings::default(), names)
}

fn started(names: &[&str]) -> CombatTracker {
    let mut tracker = tracker(names);
    tracker.start(Instant::now()).unwrap();
    tracker.drain_signals();
    tracker.drain_commands();
    tracker
}

fn id_at(tracker: &CombatTracker, index: usize) -> Uuid {
    tracker.participant_at(index).unwrap().id
}

fn names(tracker: &CombatTracker) -> Vec<String> {
    tracker
        .combat()
        .unwrap()
        .participants
        .iter()
        .map(|p| p.display_name().to_string())
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn start_requires_participants() {
    let mut tracker = tracker(&[]);
    assert_eq!(
        tracker.start(Instant::now()),
        Err(CombatError::EmptyTurnOrder)
    );
    assert!(!tracker.is_active());
}

#[test]
fn start_sets_round_one_and_first_turn() {
    let mut tracker = tracker(&["Aria", "Bram"]);
    tracker.start(Instant::now()).unwrap();

    let combat = tracker.combat().unwrap();
    let combat_id = combat.id;
    assert!(combat.is_active);
    assert_eq!(combat.round, 1);
    assert_eq!(combat.current_turn, 0);
    assert_eq!(tracker.start(Instant::now()), Err(CombatError::AlreadyActive));

    let signals = tracker.drain_signals();
    assert!(matches!(signals[0], CombatSignal::ParticipantAdded { .. }));
    assert!(signals.contains(&CombatSignal::CombatStarted { combat_id }));
}

#[test]
fn create_refuses_while_active() {
    let mut tracker = started(&["Aria"]);
    assert_eq!(
        tracker.create_combat(Uuid::new_v4(), "Second", None),
        Err(CombatError::AlreadyActive)
    );
    tracker.end().unwrap();
    assert!(tracker.create_combat(Uuid::new_v4(), "Second", None).is_ok());
}

#[test]
fn pause_and_resume_toggle_flag() {
    let mut tracker = started(&["Aria"]);
    let now = Instant::now();

    tracker.pause(now).unwrap();
    assert!(tracker.combat().unwrap().is_paused);
    assert_eq!(tracker.pause(now), Err(CombatError::AlreadyPaused));

    tracker.resume(now).unwrap();
    assert!(!tracker.combat().unwrap().is_paused);
    assert_eq!(tracker.resume(now), Err(CombatError::NotPaused));
}

#[test]
fn turn_operations_need_a_running_combat() {
    let mut tracker = tracker(&["Aria"]);
    let now = Instant::now();
    assert_eq!(tracker.next_turn(now), Err(CombatError::NotActive));
    assert_eq!(tracker.previous_turn(now), Err(CombatError::NotActive));
    assert_eq!(tracker.pause(now), Err(CombatError::NotActive));
    assert_eq!(tracker.end(), Err(CombatError::NotActive));

    let mut empty = CombatTracker::new(TrackerSettings::default());
    assert_eq!(empty.next_turn(now), Err(CombatError::NoCombat));
}

// ═══════════════════════════════════════════════════════════════════════════
// Turn Order
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn full_cycle_returns_to_start_and_adds_one_round() {
    let mut tracker = started(&["Aria", "Bram", "Cyd", "Dov"]);
    let now = Instant::now();

    for _ in 0..4 {
        tracker.next_turn(now).unwrap();
    }

    let combat = tracker.combat().unwrap();
    assert_eq!(combat.current_turn, 0);
    assert_eq!(combat.round, 2);
}

#[test]
fn next_turn_reports_new_round_on_wrap() {
    let mut tracker = started(&["Aria", "Bram"]);
    let now = Instant::now();

    let first = tracker.next_turn(now).unwrap();
    assert!(!first.new_round);
    assert_eq!(first.participant_id, Some(id_at(&tracker, 1)));

    let second = tracker.next_turn(now).unwrap();
    assert!(second.new_round);
    assert_eq!(second.round, 2);

    let signals = tracker.drain_signals();
    assert!(signals.contains(&CombatSignal::RoundStarted { round: 2 }));
}

#[test]
fn next_turn_with_everyone_removed_is_an_error() {
    let mut tracker = started(&["Aria"]);
    let id = id_at(&tracker, 0);
    tracker.remove_participant(id, Instant::now()).unwrap();
    assert_eq!(
        tracker.next_turn(Instant::now()),
        Err(CombatError::EmptyTurnOrder)
    );
}

#[test]
fn previous_turn_wraps_and_floors_round_at_one() {
    let mut tracker = started(&["Aria", "Bram", "Cyd"]);
    let now = Instant::now();

    let change = tracker.previous_turn(now).unwrap();
    assert_eq!(change.current_turn, 2);
    assert_eq!(change.round, 1);

    // Into round 2, then back across the boundary
    tracker.next_turn(now).unwrap();
    assert_eq!(tracker.combat().unwrap().round, 2);
    let change = tracker.previous_turn(now).unwrap();
    assert_eq!(change.current_turn, 2);
    assert_eq!(change.round, 1);

    let change = tracker.previous_turn(now).unwrap();
    assert_eq!(change.current_turn, 1);
    assert_eq!(change.round, 1);
}

#[test]
fn reorder_preserves_ids_and_renumbers() {
    let mut tracker = started(&["Aria", "Bram", "Cyd", "Dov"]);
    let before: HashSet<Uuid> = tracker
        .combat()
        .unwrap()
        .participants
        .iter()
        .map(|p| p.id)
        .collect();

    tracker.reorder(0, 2).unwrap();
    assert_eq!(names(&tracker), vec!["Bram", "Cyd", "Aria", "Dov"]);

    let combat = tracker.combat().unwrap();
    let after: HashSet<Uuid> = combat.participants.iter().map(|p| p.id).collect();
    assert_eq!(before, after);
    for (idx, p) in combat.participants.iter().enumerate() {
        assert_eq!(p.turn_order, idx as u32);
    }
}

#[test]
fn reorder_keeps_turn_on_acting_participant() {
    let mut tracker = started(&["Aria", "Bram", "Cyd"]);
    tracker.next_turn(Instant::now()).unwrap();
    let acting = tracker.current_participant().unwrap().id;

    tracker.reorder(1, 0).unwrap();
    assert_eq!(tracker.current_participant().unwrap().id, acting);
    assert_eq!(tracker.combat().unwrap().current_turn, 0);
}

#[test]
fn reorder_records_single_full_order_command() {
    let mut tracker = started(&["Aria", "Bram", "Cyd"]);
    tracker.reorder(2, 1).unwrap();

    let commands = tracker.drain_commands();
    let reorders: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            SyncCommand::ReorderParticipants { order, .. } => Some(order),
            _ => None,
        })
        .collect();
    assert_eq!(reorders.len(), 1);
    let positions: Vec<u32> = reorders[0].iter().map(|(_, pos)| *pos).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[test]
fn reorder_rejects_out_of_range() {
    let mut tracker = started(&["Aria", "Bram"]);
    assert_eq!(
        tracker.reorder(0, 5),
        Err(CombatError::IndexOutOfRange { index: 5, len: 2 })
    );
}

#[test]
fn sort_by_initiative_is_descending_and_stable() {
    let mut tracker = CombatTracker::new(TrackerSettings::default());
    tracker.create_combat(Uuid::new_v4(), "Sort", None).unwrap();
    for (name, init) in [("Low", 3), ("TieA", 15), ("High", 22), ("TieB", 15)] {
        tracker
            .add_participant(CombatParticipant::npc(name, init))
            .unwrap();
    }

    tracker.sort_by_initiative().unwrap();
    assert_eq!(names(&tracker), vec!["High", "TieA", "TieB", "Low"]);
}

#[test]
fn removing_earlier_participant_keeps_acting_one() {
    let mut tracker = started(&["Aria", "Bram", "Cyd"]);
    let now = Instant::now();
    tracker.next_turn(now).unwrap();
    tracker.next_turn(now).unwrap();
    let acting = tracker.current_participant().unwrap().id;

    let first = id_at(&tracker, 0);
    tracker.remove_participant(first, now).unwrap();

    assert_eq!(tracker.current_participant().unwrap().id, acting);
    let combat = tracker.combat().unwrap();
    assert_eq!(combat.participants.len(), 2);
    assert_eq!(combat.participants[1].turn_order, 1);
}

#[test]
fn removing_last_acting_participant_wraps_to_first() {
    let mut tracker = started(&["Aria", "Bram"]);
    tracker.next_turn(Instant::now()).unwrap();
    let last = id_at(&tracker, 1);

    tracker.remove_participant(last, Instant::now()).unwrap();
    assert_eq!(tracker.combat().unwrap().current_turn, 0);
}

#[test]
fn removing_earlier_participant_records_delete_reorder_and_turn() {
    let mut tracker = started(&["Aria", "Bram", "Cyd"]);
    tracker.next_turn(Instant::now()).unwrap();
    tracker.drain_commands();
    let first = id_at(&tracker, 0);

    tracker.remove_participant(first, Instant::now()).unwrap();

    let commands = tracker.drain_commands();
    assert_eq!(commands.len(), 3, "{commands:?}");
    assert!(matches!(
        commands[0],
        SyncCommand::DeleteParticipant { participant_id, .. } if participant_id == first
    ));
    match &commands[1] {
        SyncCommand::ReorderParticipants { order, .. } => {
            let positions: Vec<u32> = order.iter().map(|(_, pos)| *pos).collect();
            assert_eq!(positions, vec![0, 1]);
        }
        other => panic!("expected reorder, got {other:?}"),
    }
    assert!(matches!(
        &commands[2],
        SyncCommand::UpsertCombat { combat } if combat.current_turn == 0
    ));
}

#[test]
fn removing_acting_participant_from_middle_hands_turn_to_next() {
    let mut tracker = started(&["Aria", "Bram", "Cyd"]);
    tracker.next_turn(Instant::now()).unwrap();
    tracker.drain_signals();
    tracker.drain_commands();
    let bram = id_at(&tracker, 1);
    let cyd = id_at(&tracker, 2);

    tracker.remove_participant(bram, Instant::now()).unwrap();

    assert_eq!(names(&tracker), vec!["Aria", "Cyd"]);
    assert_eq!(tracker.combat().unwrap().current_turn, 1);
    assert_eq!(tracker.current_participant().unwrap().id, cyd);
    assert_eq!(tracker.participant(cyd).unwrap().turn_order, 1);

    let signals = tracker.drain_signals();
    assert!(signals.contains(&CombatSignal::TurnChanged {
        round: 1,
        current_turn: 1,
        participant_id: Some(cyd),
    }));

    // Index did not move, so only the delete and the new order are recorded
    let commands = tracker.drain_commands();
    assert_eq!(commands.len(), 2, "{commands:?}");
    assert!(matches!(commands[0], SyncCommand::DeleteParticipant { .. }));
    assert!(matches!(commands[1], SyncCommand::ReorderParticipants { .. }));
}

#[test]
fn removing_other_participants_keeps_turn_quiet() {
    let mut tracker = started(&["Aria", "Bram", "Cyd"]);
    let cyd = id_at(&tracker, 2);
    tracker.remove_participant(cyd, Instant::now()).unwrap();
    assert!(
        !tracker
            .drain_signals()
            .iter()
            .any(|s| matches!(s, CombatSignal::TurnChanged { .. }))
    );
}

#[test]
fn hidden_participants_only_visible_to_gm() {
    let mut tracker = tracker(&["Aria"]);
    tracker
        .add_participant(CombatParticipant::npc("Lurker", 5).hidden())
        .unwrap();

    assert_eq!(tracker.visible_participants(true).len(), 2);
    let player_view = tracker.visible_participants(false);
    assert_eq!(player_view.len(), 1);
    assert_eq!(player_view[0].display_name(), "Aria");
}

// ═══════════════════════════════════════════════════════════════════════════
// Health & Conditions
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn damage_and_heal_record_upserts() {
    let mut tracker = started(&["Aria"]);
    let id = id_at(&tracker, 0);

    let outcome = tracker.deal_damage(id, 25).unwrap();
    assert_eq!(outcome.current_hp, 0);
    assert!(outcome.downed);

    let healed = tracker.heal(id, 50).unwrap();
    assert_eq!(healed.current_hp, 10);

    let signals = tracker.drain_signals();
    assert!(signals.contains(&CombatSignal::ParticipantDowned { participant_id: id }));

    let commands = tracker.drain_commands();
    assert_eq!(commands.len(), 2);
    match &commands[1] {
        SyncCommand::UpsertParticipant { participant } => {
            assert_eq!(participant.current_hp, Some(10));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn damage_unknown_participant_fails() {
    let mut tracker = started(&["Aria"]);
    let missing = Uuid::new_v4();
    assert_eq!(
        tracker.deal_damage(missing, 1),
        Err(CombatError::ParticipantNotFound {
            participant_id: missing
        })
    );
    assert!(tracker.drain_commands().is_empty());
}

#[test]
fn condition_add_update_remove() {
    let mut tracker = started(&["Aria"]);
    let id = id_at(&tracker, 0);

    assert_eq!(
        tracker
            .add_condition(id, Condition::new("Poisoned").with_duration(3))
            .unwrap(),
        None
    );
    tracker
        .update_condition(id, "poisoned", Condition::new("Poisoned").with_duration(1))
        .unwrap();
    assert_eq!(
        tracker.participant(id).unwrap().conditions[0].duration_rounds,
        Some(1)
    );

    let removed = tracker.remove_condition(id, "POISONED").unwrap();
    assert_eq!(removed.name, "Poisoned");
    assert!(matches!(
        tracker.remove_condition(id, "Poisoned"),
        Err(CombatError::ConditionNotFound { .. })
    ));
}

#[test]
fn conditions_are_kept_by_default_across_rounds() {
    let mut tracker = started(&["Aria"]);
    let id = id_at(&tracker, 0);
    tracker
        .add_condition(id, Condition::new("Blessed").with_duration(1))
        .unwrap();

    let change = tracker.next_turn(Instant::now()).unwrap();
    assert!(change.new_round);
    assert!(change.expired_conditions.is_empty());
    assert!(tracker.participant(id).unwrap().has_condition("Blessed"));
}

#[test]
fn conditions_expire_at_round_end_when_enabled() {
    let settings = TrackerSettings {
        expire_conditions: true,
        ..Default::default()
    };
    let mut tracker = tracker_with(settings, &["Aria", "Bram"]);
    tracker.start(Instant::now()).unwrap();
    let id = id_at(&tracker, 1);
    tracker
        .add_condition(id, Condition::new("Blessed").with_duration(1))
        .unwrap();

    let now = Instant::now();
    let change = tracker.next_turn(now).unwrap();
    assert!(change.expired_conditions.is_empty());

    let change = tracker.next_turn(now).unwrap();
    assert_eq!(change.expired_conditions.len(), 1);
    assert_eq!(change.expired_conditions[0].0, id);
    assert!(!tracker.participant(id).unwrap().has_condition("Blessed"));
}

#[test]
fn update_participant_changes_fields() {
    let mut tracker = tracker(&["Aria"]);
    let id = id_at(&tracker, 0);
    tracker
        .update_participant(
            id,
            ParticipantUpdate {
                initiative: Some(7),
                armor_class: Some(16),
                is_visible: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

    let p = tracker.participant(id).unwrap();
    assert_eq!(p.initiative, 7);
    assert_eq!(p.armor_class, Some(16));
    assert!(!p.is_visible);
}

// ═══════════════════════════════════════════════════════════════════════════
// Timer Integration
// ═══════════════════════════════════════════════════════════════════════════

fn timed(names: &[&str], secs: u32, settings: TrackerSettings) -> (CombatTracker, Instant) {
    let mut tracker = CombatTracker::new(settings);
    tracker
        .create_combat(Uuid::new_v4(), "Timed", Some(secs))
        .unwrap();
    for name in names {
        tracker
            .add_participant(CombatParticipant::npc(*name, 10))
            .unwrap();
    }
    let t0 = Instant::now();
    tracker.start(t0).unwrap();
    tracker.drain_signals();
    (tracker, t0)
}

#[test]
fn timer_expiry_signals_without_advancing() {
    let (mut tracker, t0) = timed(&["Aria", "Bram"], 30, TrackerSettings::default());

    assert_eq!(tracker.tick(t0 + Duration::from_secs(10)), None);
    assert_eq!(
        tracker.tick(t0 + Duration::from_secs(30)),
        Some(TimerEvent::Expired)
    );
    assert_eq!(tracker.tick(t0 + Duration::from_secs(31)), None);

    assert_eq!(tracker.combat().unwrap().current_turn, 0);
    let expiries = tracker
        .drain_signals()
        .into_iter()
        .filter(|s| matches!(s, CombatSignal::TurnTimerExpired { .. }))
        .count();
    assert_eq!(expiries, 1);
}

#[test]
fn timer_expiry_can_auto_advance() {
    let settings = TrackerSettings {
        auto_advance_on_timeout: true,
        ..Default::default()
    };
    let (mut tracker, t0) = timed(&["Aria", "Bram"], 5, settings);

    let expiry = t0 + Duration::from_secs(5);
    assert_eq!(tracker.tick(expiry), Some(TimerEvent::Expired));
    assert_eq!(tracker.combat().unwrap().current_turn, 1);
    assert_eq!(tracker.timer().state(), TimerState::Running);
    assert_eq!(
        tracker.timer().remaining(expiry),
        Duration::from_secs(5)
    );
}

#[test]
fn next_turn_restarts_timer() {
    let (mut tracker, t0) = timed(&["Aria", "Bram"], 20, TrackerSettings::default());
    let later = t0 + Duration::from_secs(15);

    tracker.next_turn(later).unwrap();
    assert_eq!(tracker.timer().remaining(later), Duration::from_secs(20));
}

#[test]
fn pausing_combat_pauses_timer() {
    let (mut tracker, t0) = timed(&["Aria"], 20, TrackerSettings::default());
    tracker.pause(t0 + Duration::from_secs(5)).unwrap();
    assert_eq!(tracker.timer().state(), TimerState::Paused);
    assert_eq!(tracker.tick(t0 + Duration::from_secs(300)), None);

    // Turn changes while paused keep the fresh countdown paused
    tracker.next_turn(t0 + Duration::from_secs(300)).unwrap();
    assert_eq!(tracker.timer().state(), TimerState::Paused);
}

#[test]
fn ending_combat_clears_timer() {
    let (mut tracker, t0) = timed(&["Aria"], 20, TrackerSettings::default());
    assert_eq!(tracker.timer().state(), TimerState::Running);

    tracker.end().unwrap();
    assert_eq!(tracker.timer().state(), TimerState::Idle);
    assert_eq!(tracker.tick(t0 + Duration::from_secs(60)), None);

    let commands = tracker.drain_commands();
    assert!(matches!(
        commands.last(),
        Some(SyncCommand::EndCombat { .. })
    ));
}

#[test]
fn untimed_combat_never_expires() {
    let mut tracker = started(&["Aria"]);
    assert_eq!(tracker.timer().state(), TimerState::Idle);
    assert_eq!(
        tracker.tick(Instant::now() + Duration::from_secs(3600)),
        None
    );
}

#[test]
fn set_turn_timer_restarts_running_countdown() {
    let mut tracker = started(&["Aria"]);
    let now = Instant::now();
    tracker.set_turn_timer(Some(45), now).unwrap();
    assert_eq!(tracker.timer().state(), TimerState::Running);
    assert_eq!(tracker.timer().remaining(now), Duration::from_secs(45));

    tracker.set_turn_timer(None, now).unwrap();
    assert_eq!(tracker.timer().state(), TimerState::Idle);
}

#[test]
fn removing_acting_participant_restarts_expired_timer() {
    let (mut tracker, t0) = timed(&["Aria", "Bram", "Cyd"], 30, TrackerSettings::default());
    let expiry = t0 + Duration::from_secs(31);
    assert_eq!(tracker.tick(expiry), Some(TimerEvent::Expired));
    assert_eq!(tracker.timer().state(), TimerState::Expired);

    let aria = id_at(&tracker, 0);
    let bram = id_at(&tracker, 1);
    tracker.drain_signals();
    tracker.remove_participant(aria, expiry).unwrap();

    assert_eq!(tracker.current_participant().unwrap().id, bram);
    assert_eq!(tracker.timer().state(), TimerState::Running);
    assert_eq!(tracker.timer().remaining(expiry), Duration::from_secs(30));
    assert!(
        tracker
            .drain_signals()
            .iter()
            .any(|s| matches!(s, CombatSignal::TurnChanged { participant_id: Some(id), .. } if *id == bram))
    );

    // The new actor's countdown fires on its own
    assert_eq!(tracker.tick(expiry + Duration::from_secs(29)), None);
    assert_eq!(
        tracker.tick(expiry + Duration::from_secs(30)),
        Some(TimerEvent::Expired)
    );
}

#[test]
fn removing_the_only_participant_stops_timer() {
    let (mut tracker, t0) = timed(&["Aria"], 30, TrackerSettings::default());
    let aria = id_at(&tracker, 0);
    tracker.remove_participant(aria, t0).unwrap();
    assert_eq!(tracker.timer().state(), TimerState::Idle);
    assert_eq!(tracker.tick(t0 + Duration::from_secs(60)), None);
}

#[test]
fn update_participant_clamps_negative_hp() {
    let mut tracker = started(&["Aria"]);
    let id = id_at(&tracker, 0);
    tracker
        .update_participant(
            id,
            ParticipantUpdate {
                current_hp: Some(-7),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(tracker.participant(id).unwrap().current_hp, Some(0));

    assert!(matches!(
        tracker.update_participant(
            id,
            ParticipantUpdate {
                max_hp: Some(-10),
                ..Default::default()
            },
        ),
        Err(CombatError::InvalidHitPoints { .. })
    ));
}

#[test]
fn condition_update_cannot_create_duplicate_names() {
    let mut tracker = started(&["Aria"]);
    let id = id_at(&tracker, 0);
    tracker.add_condition(id, Condition::new("Poisoned")).unwrap();
    tracker.add_condition(id, Condition::new("Prone")).unwrap();
    tracker.drain_commands();

    assert!(matches!(
        tracker.update_condition(id, "Prone", Condition::new("poisoned")),
        Err(CombatError::DuplicateCondition { .. })
    ));
    assert!(tracker.drain_commands().is_empty());

    tracker.remove_condition(id, "Poisoned").unwrap();
    assert!(!tracker.participant(id).unwrap().has_condition("poisoned"));
}
