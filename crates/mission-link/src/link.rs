//! MAVLink-backed vehicle.
//!
//! Wire framing and serialization belong to the `mavlink` crate; this module
//! only drives the mission microservice on top of it and mirrors telemetry
//! into a shared snapshot.
//!
//! # Mission upload flow (this side → autopilot)
//!
//! 1. Send MISSION_COUNT with the number of slots
//! 2. Autopilot requests each slot with MISSION_REQUEST_INT (or the legacy
//!    MISSION_REQUEST)
//! 3. Answer each request with MISSION_ITEM_INT
//! 4. Autopilot finishes with MISSION_ACK
//!
//! Download runs the same exchange in the other direction, initiated with
//! MISSION_REQUEST_LIST. A transfer is a single pass: any step that does not
//! complete within the timeout fails the whole operation.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use mavlink::common::{
    MavCmd, MavFrame, MavMessage, MavMissionResult, MavModeFlag, MISSION_ACK_DATA,
    MISSION_CLEAR_ALL_DATA, MISSION_COUNT_DATA, MISSION_ITEM_INT_DATA,
    MISSION_REQUEST_INT_DATA, MISSION_REQUEST_LIST_DATA, SET_MODE_DATA,
};
use mavlink::{MavConnection, MavHeader, MavlinkVersion};

use crate::error::VehicleError;
use crate::vehicle::Vehicle;
use mission_core::models::{FlightMode, GlobalPosition, MissionItem, NavCommand};

/// Per-message timeout for mission transfers.
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(5);

/// MAVLink addressing for the link.
#[derive(Debug, Clone, Copy)]
pub struct LinkIds {
    /// Our system id on the link
    pub system_id: u8,
    /// Our component id on the link
    pub component_id: u8,
    /// System id of the autopilot
    pub target_system: u8,
    /// Component id of the autopilot
    pub target_component: u8,
}

impl Default for LinkIds {
    fn default() -> Self {
        // 255/190 is the conventional GCS address, autopilot is 1/1
        Self {
            system_id: 255,
            component_id: 190,
            target_system: 1,
            target_component: 1,
        }
    }
}

/// Telemetry snapshot maintained by the listener thread.
struct Snapshot {
    armed: bool,
    mode: FlightMode,
    position: Option<GlobalPosition>,
    home: Option<GlobalPosition>,
    current_seq: u16,
    items: Vec<MissionItem>,
    heartbeat_seen: bool,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            armed: false,
            mode: FlightMode::Stabilize,
            position: None,
            home: None,
            current_seq: 0,
            items: Vec::new(),
            heartbeat_seen: false,
        }
    }
}

/// Mission-protocol messages routed from the listener to an active transfer.
enum TransferEvent {
    Request(u16),
    Count(u16),
    Item(MISSION_ITEM_INT_DATA),
    Ack(MavMissionResult),
}

struct SharedState {
    snapshot: Mutex<Snapshot>,
    transfer: Mutex<Option<mpsc::Sender<TransferEvent>>>,
}

/// A [`Vehicle`] talking to a real autopilot over a MAVLink connection.
pub struct MavlinkVehicle {
    conn: Arc<dyn MavConnection<MavMessage> + Send + Sync>,
    state: Arc<SharedState>,
    ids: LinkIds,
    tx_seq: AtomicU8,
}

impl MavlinkVehicle {
    /// Open a MAVLink connection and start the listener thread.
    ///
    /// `address` uses the `mavlink` crate's connection-string format, e.g.
    /// `udpin:0.0.0.0:14550`, `tcpout:10.0.0.2:5760` or
    /// `serial:/dev/ttyUSB0:57600`.
    pub fn connect(address: &str, ids: LinkIds) -> Result<Self, VehicleError> {
        let mut conn = mavlink::connect::<MavMessage>(address)?;
        conn.set_protocol_version(MavlinkVersion::V2);
        let conn: Arc<dyn MavConnection<MavMessage> + Send + Sync> = Arc::from(conn);

        let state = Arc::new(SharedState {
            snapshot: Mutex::new(Snapshot::default()),
            transfer: Mutex::new(None),
        });

        spawn_listener(conn.clone(), state.clone(), ids);

        Ok(Self {
            conn,
            state,
            ids,
            tx_seq: AtomicU8::new(0),
        })
    }

    /// Block until the autopilot's first heartbeat arrives.
    pub fn wait_heartbeat(&self, timeout: Duration) -> Result<(), VehicleError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.lock_snapshot().heartbeat_seen {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(VehicleError::NoHeartbeat);
            }
            thread::sleep(Duration::from_millis(50));
        }
    }

    fn lock_snapshot(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        self.state.snapshot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn send(&self, msg: MavMessage) -> Result<(), VehicleError> {
        let header = MavHeader {
            system_id: self.ids.system_id,
            component_id: self.ids.component_id,
            sequence: self.tx_seq.fetch_add(1, Ordering::Relaxed),
        };
        self.conn.send(&header, &msg)?;
        Ok(())
    }

    /// Install a transfer channel; mission-protocol traffic is routed to the
    /// returned receiver until [`Self::end_transfer`].
    fn begin_transfer(&self) -> mpsc::Receiver<TransferEvent> {
        let (tx, rx) = mpsc::channel();
        *self
            .state
            .transfer
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(tx);
        rx
    }

    fn end_transfer(&self) {
        *self
            .state
            .transfer
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Answer one MISSION_REQUEST for `slot`. Slot 0 is the home placeholder;
    /// slots 1.. come from `items`.
    fn send_slot(
        &self,
        slot: u16,
        items: &[MissionItem],
        home: Option<GlobalPosition>,
    ) -> Result<(), VehicleError> {
        let data = if slot == 0 {
            // The autopilot overwrites slot 0 with its own home location;
            // content only needs to be well-formed.
            let home = home.unwrap_or(GlobalPosition::new(0.0, 0.0, 0.0));
            MISSION_ITEM_INT_DATA {
                target_system: self.ids.target_system,
                target_component: self.ids.target_component,
                seq: 0,
                frame: MavFrame::MAV_FRAME_GLOBAL_RELATIVE_ALT_INT,
                command: MavCmd::MAV_CMD_NAV_WAYPOINT,
                current: 0,
                autocontinue: 1,
                x: (home.lat * 1e7) as i32,
                y: (home.lon * 1e7) as i32,
                z: home.alt_m as f32,
                ..Default::default()
            }
        } else {
            let item = items
                .iter()
                .find(|item| item.seq == slot)
                .ok_or_else(|| VehicleError::Rejected(format!("requested slot {slot} out of range")))?;
            encode_item(item, self.ids.target_system, self.ids.target_component)?
        };
        self.send(MavMessage::MISSION_ITEM_INT(data))
    }

    fn clear_all(&self) -> Result<(), VehicleError> {
        let rx = self.begin_transfer();
        let result = (|| {
            self.send(MavMessage::MISSION_CLEAR_ALL(MISSION_CLEAR_ALL_DATA {
                target_system: self.ids.target_system,
                target_component: self.ids.target_component,
                ..Default::default()
            }))?;
            loop {
                match rx.recv_timeout(TRANSFER_TIMEOUT) {
                    Ok(TransferEvent::Ack(MavMissionResult::MAV_MISSION_ACCEPTED)) => {
                        return Ok(())
                    }
                    Ok(TransferEvent::Ack(other)) => {
                        return Err(VehicleError::Rejected(format!("{other:?}")))
                    }
                    Ok(_) => continue,
                    Err(_) => return Err(VehicleError::Timeout("MISSION_ACK")),
                }
            }
        })();
        self.end_transfer();
        result
    }
}

impl Vehicle for MavlinkVehicle {
    fn download_mission(&self) -> Result<Vec<MissionItem>, VehicleError> {
        let rx = self.begin_transfer();
        let result = (|| {
            self.send(MavMessage::MISSION_REQUEST_LIST(MISSION_REQUEST_LIST_DATA {
                target_system: self.ids.target_system,
                target_component: self.ids.target_component,
                ..Default::default()
            }))?;

            let total = loop {
                match rx.recv_timeout(TRANSFER_TIMEOUT) {
                    Ok(TransferEvent::Count(count)) => break count,
                    Ok(_) => continue,
                    Err(_) => return Err(VehicleError::Timeout("MISSION_COUNT")),
                }
            };

            let mut items = Vec::new();
            for seq in 0..total {
                self.send(MavMessage::MISSION_REQUEST_INT(MISSION_REQUEST_INT_DATA {
                    target_system: self.ids.target_system,
                    target_component: self.ids.target_component,
                    seq,
                    ..Default::default()
                }))?;
                let data = loop {
                    match rx.recv_timeout(TRANSFER_TIMEOUT) {
                        Ok(TransferEvent::Item(data)) if data.seq == seq => break data,
                        Ok(_) => continue,
                        Err(_) => return Err(VehicleError::Timeout("MISSION_ITEM_INT")),
                    }
                };
                // Slot 0 is the autopilot's home location, not part of the mission
                if seq > 0 {
                    items.push(decode_item(&data));
                }
            }

            self.send(MavMessage::MISSION_ACK(MISSION_ACK_DATA {
                target_system: self.ids.target_system,
                target_component: self.ids.target_component,
                mavtype: MavMissionResult::MAV_MISSION_ACCEPTED,
                ..Default::default()
            }))?;
            Ok(items)
        })();
        self.end_transfer();

        let items = result?;
        tracing::debug!(count = items.len(), "mission downloaded");
        let mut snapshot = self.lock_snapshot();
        snapshot.items = items.clone();
        Ok(items)
    }

    fn upload_mission(&self, items: &[MissionItem]) -> Result<(), VehicleError> {
        if items.is_empty() {
            self.clear_all()?;
            let mut snapshot = self.lock_snapshot();
            snapshot.items.clear();
            snapshot.current_seq = 0;
            return Ok(());
        }

        let home = self.home_position();
        let rx = self.begin_transfer();
        let result = (|| {
            // One slot per item plus the home slot
            let total = items.len() as u16 + 1;
            self.send(MavMessage::MISSION_COUNT(MISSION_COUNT_DATA {
                target_system: self.ids.target_system,
                target_component: self.ids.target_component,
                count: total,
                ..Default::default()
            }))?;

            loop {
                match rx.recv_timeout(TRANSFER_TIMEOUT) {
                    Ok(TransferEvent::Request(slot)) => {
                        tracing::trace!(slot, "answering mission request");
                        self.send_slot(slot, items, home)?;
                    }
                    Ok(TransferEvent::Ack(MavMissionResult::MAV_MISSION_ACCEPTED)) => {
                        return Ok(())
                    }
                    Ok(TransferEvent::Ack(other)) => {
                        return Err(VehicleError::Rejected(format!("{other:?}")))
                    }
                    Ok(_) => continue,
                    Err(_) => return Err(VehicleError::Timeout("MISSION_REQUEST")),
                }
            }
        })();
        self.end_transfer();
        result?;

        tracing::debug!(count = items.len(), "mission uploaded");
        let mut snapshot = self.lock_snapshot();
        snapshot.items = items.to_vec();
        snapshot.current_seq = 0;
        Ok(())
    }

    fn mission_items(&self) -> Vec<MissionItem> {
        self.lock_snapshot().items.clone()
    }

    fn current_sequence(&self) -> u16 {
        self.lock_snapshot().current_seq
    }

    fn set_mode(&self, mode: FlightMode) -> Result<(), VehicleError> {
        tracing::debug!(%mode, "switching flight mode");
        self.send(MavMessage::SET_MODE(SET_MODE_DATA {
            target_system: self.ids.target_system,
            base_mode: MavModeFlag::MAV_MODE_FLAG_CUSTOM_MODE_ENABLED,
            custom_mode: mode.custom_mode(),
        }))
    }

    fn mode(&self) -> FlightMode {
        self.lock_snapshot().mode
    }

    fn armed(&self) -> bool {
        self.lock_snapshot().armed
    }

    fn position(&self) -> Option<GlobalPosition> {
        self.lock_snapshot().position
    }

    fn home_position(&self) -> Option<GlobalPosition> {
        self.lock_snapshot().home
    }
}

fn spawn_listener(
    conn: Arc<dyn MavConnection<MavMessage> + Send + Sync>,
    state: Arc<SharedState>,
    ids: LinkIds,
) {
    thread::Builder::new()
        .name("mavlink-listener".into())
        .spawn(move || loop {
            match conn.recv() {
                Ok((header, msg)) => {
                    if header.system_id != ids.target_system {
                        continue;
                    }
                    handle_message(&state, msg);
                }
                Err(mavlink::error::MessageReadError::Io(e))
                    if e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "mavlink read failed");
                    thread::sleep(Duration::from_millis(100));
                }
            }
        })
        .expect("spawn mavlink listener");
}

fn handle_message(state: &SharedState, msg: MavMessage) {
    match msg {
        MavMessage::HEARTBEAT(hb) => {
            let mut snapshot = state.snapshot.lock().unwrap_or_else(|e| e.into_inner());
            snapshot.armed = hb.base_mode.contains(MavModeFlag::MAV_MODE_FLAG_SAFETY_ARMED);
            snapshot.mode = FlightMode::from_custom_mode(hb.custom_mode);
            snapshot.heartbeat_seen = true;
        }
        MavMessage::GLOBAL_POSITION_INT(p) => {
            let mut snapshot = state.snapshot.lock().unwrap_or_else(|e| e.into_inner());
            snapshot.position = Some(GlobalPosition::new(
                p.lat as f64 / 1e7,
                p.lon as f64 / 1e7,
                p.relative_alt as f64 / 1000.0,
            ));
        }
        MavMessage::HOME_POSITION(h) => {
            let mut snapshot = state.snapshot.lock().unwrap_or_else(|e| e.into_inner());
            snapshot.home = Some(GlobalPosition::new(
                h.latitude as f64 / 1e7,
                h.longitude as f64 / 1e7,
                h.altitude as f64 / 1000.0,
            ));
        }
        MavMessage::MISSION_CURRENT(mc) => {
            let mut snapshot = state.snapshot.lock().unwrap_or_else(|e| e.into_inner());
            snapshot.current_seq = mc.seq;
        }
        MavMessage::MISSION_REQUEST_INT(r) => forward(state, TransferEvent::Request(r.seq)),
        MavMessage::MISSION_REQUEST(r) => forward(state, TransferEvent::Request(r.seq)),
        MavMessage::MISSION_COUNT(c) => forward(state, TransferEvent::Count(c.count)),
        MavMessage::MISSION_ITEM_INT(i) => forward(state, TransferEvent::Item(i)),
        MavMessage::MISSION_ACK(a) => forward(state, TransferEvent::Ack(a.mavtype)),
        _ => {}
    }
}

fn forward(state: &SharedState, event: TransferEvent) {
    let transfer = state.transfer.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(tx) = transfer.as_ref() {
        let _ = tx.send(event);
    } else {
        tracing::trace!("mission message with no transfer in progress");
    }
}

fn encode_item(
    item: &MissionItem,
    target_system: u8,
    target_component: u8,
) -> Result<MISSION_ITEM_INT_DATA, VehicleError> {
    let command = match item.command {
        NavCommand::Waypoint => MavCmd::MAV_CMD_NAV_WAYPOINT,
        NavCommand::LoiterUnlimited => MavCmd::MAV_CMD_NAV_LOITER_UNLIM,
        NavCommand::LoiterTime => MavCmd::MAV_CMD_NAV_LOITER_TIME,
        NavCommand::ReturnToLaunch => MavCmd::MAV_CMD_NAV_RETURN_TO_LAUNCH,
        NavCommand::Land => MavCmd::MAV_CMD_NAV_LAND,
        NavCommand::Takeoff => MavCmd::MAV_CMD_NAV_TAKEOFF,
        NavCommand::Other(id) => return Err(VehicleError::UnsupportedCommand(id)),
    };
    Ok(MISSION_ITEM_INT_DATA {
        target_system,
        target_component,
        seq: item.seq,
        frame: MavFrame::MAV_FRAME_GLOBAL_RELATIVE_ALT_INT,
        command,
        current: 0,
        autocontinue: item.autocontinue as u8,
        param1: item.hold_s,
        param2: item.accept_radius_m,
        x: (item.lat * 1e7) as i32,
        y: (item.lon * 1e7) as i32,
        z: item.alt_m as f32,
        ..Default::default()
    })
}

fn decode_item(data: &MISSION_ITEM_INT_DATA) -> MissionItem {
    MissionItem {
        seq: data.seq,
        command: NavCommand::from_mav_cmd(data.command as u16),
        lat: data.x as f64 / 1e7,
        lon: data.y as f64 / 1e7,
        alt_m: data.z as f64,
        hold_s: data.param1,
        accept_radius_m: data.param2,
        autocontinue: data.autocontinue != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_item_round_trip() {
        let item = MissionItem {
            seq: 3,
            command: NavCommand::Waypoint,
            lat: 33.6846,
            lon: -117.8265,
            alt_m: 50.0,
            hold_s: 2.0,
            accept_radius_m: 5.0,
            autocontinue: true,
        };
        let data = encode_item(&item, 1, 1).unwrap();
        let back = decode_item(&data);
        assert_eq!(back.seq, 3);
        assert_eq!(back.command, NavCommand::Waypoint);
        assert!((back.lat - item.lat).abs() < 1e-6);
        assert!((back.lon - item.lon).abs() < 1e-6);
        assert!((back.alt_m - item.alt_m).abs() < 1e-3);
    }

    #[test]
    fn encode_rejects_unknown_commands() {
        let mut item = MissionItem::waypoint(1, 0.0, 0.0, 0.0);
        item.command = NavCommand::Other(185);
        assert!(matches!(
            encode_item(&item, 1, 1),
            Err(VehicleError::UnsupportedCommand(185))
        ));
    }
}
