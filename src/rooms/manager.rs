//! Authoritative room registry and race lifecycle.
//!
//! One instance owns all rooms for the deployment. Commands are serialized
//! by the caller (the gateway holds it behind a mutex), so the manager
//! itself is plain single-threaded state. Rejected commands come back as
//! `None`/`false`, never as faults.

use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{
    constants, PlayerPosition, PositionSample, RaceResult, Room, RoomPlayer, RoomStatus,
};

/// Result of a leave operation.
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    pub room_id: Uuid,
    /// `None` when the room emptied and was deleted.
    pub room: Option<Room>,
    /// Final standings, when the leaver was the last unfinished member of
    /// a running race.
    pub standings: Option<Vec<RaceResult>>,
}

/// In-memory registry of rooms, memberships, positions, and finishers.
#[derive(Debug, Default)]
pub struct RoomManager {
    rooms: HashMap<Uuid, Room>,
    user_to_room: HashMap<String, Uuid>,
    positions: HashMap<Uuid, HashMap<String, PlayerPosition>>,
    finishers: HashMap<Uuid, Vec<RaceResult>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with the caller as host. The track seed is drawn once
    /// and never changes.
    pub fn create_room(&mut self, host_id: &str, host_name: &str, room_name: &str) -> Room {
        let room_id = Uuid::new_v4();
        let track_seed = rand::thread_rng().gen_range(0..constants::SEED_RANGE);

        let room = Room {
            id: room_id,
            name: room_name.to_string(),
            host_id: host_id.to_string(),
            players: vec![RoomPlayer {
                user_id: host_id.to_string(),
                username: host_name.to_string(),
                is_ready: false,
                is_host: true,
                selected_car: None,
            }],
            max_players: constants::MAX_PLAYERS,
            status: RoomStatus::Waiting,
            track_seed,
            created_at: Utc::now(),
        };

        self.rooms.insert(room_id, room.clone());
        self.user_to_room.insert(host_id.to_string(), room_id);
        self.positions.insert(room_id, HashMap::new());

        info!(room = %room_id, name = room_name, host = host_id, seed = track_seed, "room created");
        room
    }

    /// Join a waiting room with spare capacity. Re-joining is idempotent.
    pub fn join_room(&mut self, room_id: Uuid, user_id: &str, username: &str) -> Option<Room> {
        let room = self.rooms.get_mut(&room_id)?;

        if room.status != RoomStatus::Waiting {
            return None;
        }
        if room.players.len() >= room.max_players {
            return None;
        }
        if room.players.iter().any(|p| p.user_id == user_id) {
            return Some(room.clone());
        }

        room.players.push(RoomPlayer {
            user_id: user_id.to_string(),
            username: username.to_string(),
            is_ready: false,
            is_host: false,
            selected_car: None,
        });
        let snapshot = room.clone();
        self.user_to_room.insert(user_id.to_string(), room_id);

        debug!(room = %room_id, user = user_id, "player joined");
        Some(snapshot)
    }

    /// Remove the caller from their room. Deletes the room when it empties;
    /// otherwise transfers host to the earliest remaining member.
    pub fn leave_room(&mut self, user_id: &str) -> Option<LeaveOutcome> {
        let room_id = self.user_to_room.remove(user_id)?;
        let room = self.rooms.get_mut(&room_id)?;

        room.players.retain(|p| p.user_id != user_id);
        if let Some(positions) = self.positions.get_mut(&room_id) {
            positions.remove(user_id);
        }

        if room.players.is_empty() {
            self.rooms.remove(&room_id);
            self.positions.remove(&room_id);
            self.finishers.remove(&room_id);
            info!(room = %room_id, "room emptied and deleted");
            return Some(LeaveOutcome { room_id, room: None, standings: None });
        }

        if room.host_id == user_id {
            room.host_id = room.players[0].user_id.clone();
            room.players[0].is_host = true;
            debug!(room = %room_id, new_host = %room.host_id, "host transferred");
        }

        // The leaver drops out of the completion requirement: if everyone
        // still present has finished, the race is over
        let standings = self.completed_standings(room_id);
        let snapshot = self.rooms.get(&room_id)?.clone();
        debug!(room = %room_id, user = user_id, "player left");
        Some(LeaveOutcome { room_id, room: Some(snapshot), standings })
    }

    /// Flip the caller's own ready flag. Host flag is untouched.
    pub fn toggle_ready(&mut self, user_id: &str) -> Option<Room> {
        let room_id = *self.user_to_room.get(user_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        if let Some(player) = room.players.iter_mut().find(|p| p.user_id == user_id) {
            player.is_ready = !player.is_ready;
        }
        Some(room.clone())
    }

    /// Record a cosmetic car selection for the caller.
    pub fn select_car(&mut self, user_id: &str, car_id: &str) -> Option<Room> {
        let room_id = *self.user_to_room.get(user_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        if let Some(player) = room.players.iter_mut().find(|p| p.user_id == user_id) {
            player.selected_car = Some(car_id.to_string());
        }
        Some(room.clone())
    }

    /// Host-only race start: requires a waiting room with at least two
    /// members and every non-host member ready. Moves the room into
    /// countdown; once underway the race cannot be re-armed.
    pub fn start_race(&mut self, user_id: &str) -> Option<Room> {
        let room_id = *self.user_to_room.get(user_id)?;
        let room = self.rooms.get_mut(&room_id)?;

        if room.status != RoomStatus::Waiting {
            return None;
        }
        if room.host_id != user_id {
            return None;
        }
        if room.players.len() < constants::MIN_PLAYERS_TO_START {
            return None;
        }
        if !room.players.iter().all(|p| p.is_ready || p.is_host) {
            return None;
        }

        room.status = RoomStatus::Countdown;
        self.finishers.insert(room_id, Vec::new());
        info!(room = %room_id, "race starting");
        Some(room.clone())
    }

    pub fn set_race_status(&mut self, room_id: Uuid, status: RoomStatus) {
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.status = status;
        }
    }

    /// Store the caller's latest position snapshot, overwriting any prior
    /// value. No-op when the caller has no room.
    pub fn update_position(
        &mut self,
        user_id: &str,
        sample: PositionSample,
    ) -> Option<PlayerPosition> {
        let room_id = *self.user_to_room.get(user_id)?;
        let room = self.rooms.get(&room_id)?;
        let player = room.player(user_id)?;

        let full = PlayerPosition {
            player_id: user_id.to_string(),
            username: player.username.clone(),
            x: sample.x,
            z: sample.z,
            speed: sample.speed,
            lap_time: sample.lap_time,
            position: sample.position,
        };

        if let Some(positions) = self.positions.get_mut(&room_id) {
            positions.insert(user_id.to_string(), full.clone());
        }
        Some(full)
    }

    /// Latest known positions for every member of a room.
    pub fn room_positions(&self, room_id: Uuid) -> Vec<PlayerPosition> {
        self.positions
            .get(&room_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Record a finisher; position is finish order. Returns the final
    /// standings once every current member has finished, flipping the room
    /// to `Finished`.
    pub fn record_finish(&mut self, user_id: &str, lap_time: f64) -> Option<Vec<RaceResult>> {
        let room_id = *self.user_to_room.get(user_id)?;
        let room = self.rooms.get(&room_id)?;
        let username = room.player(user_id)?.username.clone();

        let finishers = self.finishers.entry(room_id).or_default();
        if finishers.iter().any(|r| r.player_id == user_id) {
            return None;
        }
        let position = finishers.len() as u32 + 1;
        finishers.push(RaceResult {
            player_id: user_id.to_string(),
            username,
            lap_time,
            position,
        });
        info!(room = %room_id, user = user_id, position, "player finished");

        self.completed_standings(room_id)
    }

    /// Final standings if every current member of a running race has
    /// finished; flips the room to `Finished` when it fires.
    fn completed_standings(&mut self, room_id: Uuid) -> Option<Vec<RaceResult>> {
        let room = self.rooms.get(&room_id)?;
        if room.status != RoomStatus::Racing {
            return None;
        }
        let finishers = self.finishers.get(&room_id)?;
        if finishers.is_empty() {
            return None;
        }
        let all_finished = room
            .players
            .iter()
            .all(|p| finishers.iter().any(|r| r.player_id == p.user_id));
        if !all_finished {
            return None;
        }

        let results = finishers.clone();
        self.set_race_status(room_id, RoomStatus::Finished);
        info!(room = %room_id, finishers = results.len(), "race complete");
        Some(results)
    }

    pub fn room(&self, room_id: Uuid) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn room_by_user(&self, user_id: &str) -> Option<&Room> {
        let room_id = self.user_to_room.get(user_id)?;
        self.rooms.get(room_id)
    }

    pub fn room_id_by_user(&self, user_id: &str) -> Option<Uuid> {
        self.user_to_room.get(user_id).copied()
    }

    /// Waiting rooms with spare capacity, for lobby listing.
    pub fn available_rooms(&self) -> Vec<Room> {
        self.rooms
            .values()
            .filter(|r| r.status == RoomStatus::Waiting && !r.is_full())
            .cloned()
            .collect()
    }

    /// Forcibly remove a room and all of its bookkeeping.
    pub fn delete_room(&mut self, room_id: Uuid) -> bool {
        let Some(room) = self.rooms.remove(&room_id) else {
            return false;
        };
        for player in &room.players {
            self.user_to_room.remove(&player.user_id);
        }
        self.positions.remove(&room_id);
        self.finishers.remove(&room_id);
        info!(room = %room_id, "room closed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_all_guests(manager: &mut RoomManager, guests: &[&str]) {
        for guest in guests {
            manager.toggle_ready(guest);
        }
    }

    #[test]
    fn create_room_makes_caller_the_sole_host() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        assert_eq!(room.host_id, "u1");
        assert_eq!(room.players.len(), 1);
        assert!(room.players[0].is_host);
        assert_eq!(room.status, RoomStatus::Waiting);
        assert!(room.track_seed < constants::SEED_RANGE);
    }

    #[test]
    fn seed_is_stable_across_joins() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        let seed = room.track_seed;
        m.join_room(room.id, "u2", "Bob").unwrap();
        m.join_room(room.id, "u3", "Cara").unwrap();
        assert_eq!(m.room(room.id).unwrap().track_seed, seed);
    }

    #[test]
    fn join_is_idempotent_for_existing_member() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "Bob").unwrap();
        let again = m.join_room(room.id, "u2", "Bob").unwrap();
        assert_eq!(again.players.len(), 2);
    }

    #[test]
    fn join_rejected_when_full_missing_or_started() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "B").unwrap();
        m.join_room(room.id, "u3", "C").unwrap();
        m.join_room(room.id, "u4", "D").unwrap();
        // at capacity
        assert!(m.join_room(room.id, "u5", "E").is_none());
        assert_eq!(m.room(room.id).unwrap().players.len(), 4);
        // unknown room
        assert!(m.join_room(Uuid::new_v4(), "u5", "E").is_none());
        // non-waiting room
        m.set_race_status(room.id, RoomStatus::Racing);
        assert!(m.join_room(room.id, "u5", "E").is_none());
    }

    #[test]
    fn capacity_and_single_host_hold_under_churn() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        for i in 2..10 {
            m.join_room(room.id, &format!("u{i}"), "guest");
            let snapshot = m.room(room.id).unwrap();
            assert!(snapshot.players.len() <= snapshot.max_players);
            assert_eq!(snapshot.players.iter().filter(|p| p.is_host).count(), 1);
        }
        m.leave_room("u2");
        m.leave_room("u1");
        let snapshot = m.room(room.id).unwrap();
        assert_eq!(snapshot.players.iter().filter(|p| p.is_host).count(), 1);
    }

    #[test]
    fn host_transfers_to_earliest_remaining_member() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "Bob").unwrap();
        m.join_room(room.id, "u3", "Cara").unwrap();
        let outcome = m.leave_room("u1").unwrap();
        let room = outcome.room.unwrap();
        assert_eq!(room.host_id, "u2");
        assert!(room.player("u2").unwrap().is_host);
        assert!(!room.player("u3").unwrap().is_host);
    }

    #[test]
    fn non_host_leave_preserves_host() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "Bob").unwrap();
        m.join_room(room.id, "u3", "Cara").unwrap();
        let outcome = m.leave_room("u2").unwrap();
        assert_eq!(outcome.room.unwrap().host_id, "u1");
    }

    #[test]
    fn last_leave_deletes_the_room() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        let outcome = m.leave_room("u1").unwrap();
        assert!(outcome.room.is_none());
        assert!(m.room(room.id).is_none());
        assert!(m.room_by_user("u1").is_none());
    }

    #[test]
    fn toggle_ready_is_self_inverse_and_isolated() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "Bob").unwrap();
        let after = m.toggle_ready("u2").unwrap();
        assert!(after.player("u2").unwrap().is_ready);
        assert!(!after.player("u1").unwrap().is_ready);
        let back = m.toggle_ready("u2").unwrap();
        assert!(!back.player("u2").unwrap().is_ready);
        // roomless caller is a no-op
        assert!(m.toggle_ready("ghost").is_none());
    }

    #[test]
    fn start_race_guards() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        // alone: too few players
        assert!(m.start_race("u1").is_none());
        m.join_room(room.id, "u2", "Bob").unwrap();
        // guest not ready
        assert!(m.start_race("u1").is_none());
        ready_all_guests(&mut m, &["u2"]);
        // non-host cannot start
        assert!(m.start_race("u2").is_none());
        let started = m.start_race("u1").unwrap();
        assert_eq!(started.status, RoomStatus::Countdown);
    }

    #[test]
    fn start_race_rejected_once_underway() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "Bob").unwrap();
        ready_all_guests(&mut m, &["u2"]);
        m.start_race("u1").unwrap();

        // re-issuing during countdown must not re-arm the timer
        assert!(m.start_race("u1").is_none());
        assert_eq!(m.room(room.id).unwrap().status, RoomStatus::Countdown);

        // nor may a running race fall back into countdown
        m.set_race_status(room.id, RoomStatus::Racing);
        m.record_finish("u2", 58.0);
        assert!(m.start_race("u1").is_none());
        assert_eq!(m.room(room.id).unwrap().status, RoomStatus::Racing);
        // the recorded finisher survives the rejected restart
        let results = m.record_finish("u1", 60.0).unwrap();
        assert_eq!(results[0].player_id, "u2");
    }

    #[test]
    fn host_readiness_is_not_required() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "Bob").unwrap();
        ready_all_guests(&mut m, &["u2"]);
        assert!(!m.room(room.id).unwrap().player("u1").unwrap().is_ready);
        assert!(m.start_race("u1").is_some());
    }

    #[test]
    fn position_updates_are_latest_wins() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        let sample = |z| PositionSample {
            x: 0.0,
            z,
            speed: 5000.0,
            lap_time: 3.0,
            position: 1,
        };
        let full = m.update_position("u1", sample(100.0)).unwrap();
        assert_eq!(full.username, "Alice");
        m.update_position("u1", sample(250.0)).unwrap();
        let positions = m.room_positions(room.id);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].z, 250.0);
        // roomless caller drops silently
        assert!(m.update_position("ghost", sample(1.0)).is_none());
    }

    #[test]
    fn available_rooms_hides_full_and_started() {
        let mut m = RoomManager::new();
        let open = m.create_room("u1", "Alice", "Open");
        let racing = m.create_room("u2", "Bob", "Racing");
        m.set_race_status(racing.id, RoomStatus::Racing);
        let full = m.create_room("u3", "Cara", "Full");
        m.join_room(full.id, "u4", "D").unwrap();
        m.join_room(full.id, "u5", "E").unwrap();
        m.join_room(full.id, "u6", "F").unwrap();

        let available = m.available_rooms();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, open.id);
    }

    #[test]
    fn delete_room_clears_all_bookkeeping() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "Bob").unwrap();
        assert!(m.delete_room(room.id));
        assert!(m.room(room.id).is_none());
        assert!(m.room_by_user("u1").is_none());
        assert!(m.room_by_user("u2").is_none());
        assert!(!m.delete_room(room.id));
    }

    #[test]
    fn finish_order_produces_standings_when_all_done() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "Bob").unwrap();
        ready_all_guests(&mut m, &["u2"]);
        m.start_race("u1").unwrap();
        m.set_race_status(room.id, RoomStatus::Racing);

        assert!(m.record_finish("u2", 61.5).is_none());
        // double finish is ignored
        assert!(m.record_finish("u2", 59.0).is_none());
        let results = m.record_finish("u1", 64.0).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].player_id, "u2");
        assert_eq!(results[0].position, 1);
        assert_eq!(results[1].position, 2);
        assert_eq!(m.room(room.id).unwrap().status, RoomStatus::Finished);
    }

    #[test]
    fn last_unfinished_leaver_completes_the_race() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "Bob").unwrap();
        m.join_room(room.id, "u3", "Cara").unwrap();
        ready_all_guests(&mut m, &["u2", "u3"]);
        m.start_race("u1").unwrap();
        m.set_race_status(room.id, RoomStatus::Racing);

        assert!(m.record_finish("u2", 61.5).is_none());
        assert!(m.record_finish("u1", 64.0).is_none());

        // the only unfinished member walks away
        let outcome = m.leave_room("u3").unwrap();
        let standings = outcome.standings.unwrap();
        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].player_id, "u2");
        assert_eq!(standings[1].player_id, "u1");
        let snapshot = outcome.room.unwrap();
        assert_eq!(snapshot.status, RoomStatus::Finished);
    }

    #[test]
    fn leave_with_racers_still_out_produces_no_standings() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "Bob").unwrap();
        m.join_room(room.id, "u3", "Cara").unwrap();
        ready_all_guests(&mut m, &["u2", "u3"]);
        m.start_race("u1").unwrap();
        m.set_race_status(room.id, RoomStatus::Racing);

        // a finished member leaving changes nothing for the rest
        assert!(m.record_finish("u2", 61.5).is_none());
        let outcome = m.leave_room("u2").unwrap();
        assert!(outcome.standings.is_none());
        assert_eq!(m.room(room.id).unwrap().status, RoomStatus::Racing);

        // lobby leaves never produce standings either
        let lobby = m.create_room("u9", "Zoe", "Lobby");
        m.join_room(lobby.id, "u8", "Yan").unwrap();
        let outcome = m.leave_room("u8").unwrap();
        assert!(outcome.standings.is_none());
    }

    #[test]
    fn select_car_sets_only_the_callers_selection() {
        let mut m = RoomManager::new();
        let room = m.create_room("u1", "Alice", "Speedway");
        m.join_room(room.id, "u2", "Bob").unwrap();
        let updated = m.select_car("u2", "car03").unwrap();
        assert_eq!(updated.player("u2").unwrap().selected_car.as_deref(), Some("car03"));
        assert!(updated.player("u1").unwrap().selected_car.is_none());
    }
}
