use serde::{ Deserialize, Serialize };

use crate::error::FetchError;

pub mod driver_api;

/// One reading of the driver endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverSnapshot {
    pub driver_name: String,
    pub driver_team: String,
    pub driver_number: String,
    pub driver_license: String,
    pub driver_irating: i64,
    pub driver_incidents: i64,
    pub team_incidents: i64,
    // iRacing reports -1 before the first lap is completed
    pub driver_laps: i64,
    pub total_laps: i64,
    pub timestamp: String,
}

impl DriverSnapshot {
    /// Looks up a field by its wire name, formatted for display.
    pub fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "driver_name" => self.driver_name.clone(),
            "driver_team" => self.driver_team.clone(),
            "driver_number" => self.driver_number.clone(),
            "driver_license" => self.driver_license.clone(),
            "driver_irating" => self.driver_irating.to_string(),
            "driver_incidents" => self.driver_incidents.to_string(),
            "team_incidents" => self.team_incidents.to_string(),
            "driver_laps" => self.driver_laps.to_string(),
            "total_laps" => self.total_laps.to_string(),
            "timestamp" => self.timestamp.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// The outcome of one tick: a snapshot, or the reason there is none.
pub type PollResult = Result<DriverSnapshot, FetchError>;

#[derive(Debug, Clone)]
pub enum Update {
    Driver(DriverSnapshot),
    Offline(String),
}

impl From<PollResult> for Update {
    fn from(result: PollResult) -> Update {
        match result {
            Ok(snapshot) => Update::Driver(snapshot),
            Err(err) => Update::Offline(err.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_snapshot(name: &str) -> DriverSnapshot {
    DriverSnapshot {
        driver_name: name.to_string(),
        driver_team: "TDK Motorsports".to_string(),
        driver_number: "42".to_string(),
        driver_license: "A 4.50".to_string(),
        driver_irating: 2750,
        driver_incidents: 2,
        team_incidents: 6,
        driver_laps: 12,
        total_laps: 30,
        timestamp: "2026-10-18T14:03:11.512000".to_string(),
    }
}
