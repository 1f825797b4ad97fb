//! Fixed choice lists used by the report forms and stored as text columns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A stored value did not match any known choice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value '{value}'")]
pub struct ParseChoiceError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseChoiceError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Account role. Decides which dashboard a user lands on and what they may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    Leader,
    Foreman,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Superadmin, Role::Leader, Role::Foreman];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Leader => "leader",
            Role::Foreman => "foreman",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Superadmin => "Super Admin",
            Role::Admin => "Admin",
            Role::Leader => "Leader",
            Role::Foreman => "Foreman",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }
}

impl FromStr for Role {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Role::Superadmin),
            "admin" => Ok(Role::Admin),
            "leader" => Ok(Role::Leader),
            "foreman" => Ok(Role::Foreman),
            other => Err(ParseChoiceError::new("role", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workshop department of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Department {
    Support,
    Track,
    Plant,
    Wheel,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Department::Support,
        Department::Track,
        Department::Plant,
        Department::Wheel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Support => "SUPPORT",
            Department::Track => "TRACK",
            Department::Plant => "PLANT",
            Department::Wheel => "WHEEL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Department::Support => "Support & Fabrikasi",
            Department::Track => "Track",
            Department::Plant => "PCH",
            Department::Wheel => "Wheel",
        }
    }
}

impl FromStr for Department {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseChoiceError::new("department", s))
    }
}

/// Working shift. `Off` only appears through the shift rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Shift {
    Off,
    First,
    Second,
}

impl Shift {
    /// Rotation used by the weekly shift generator.
    pub const ROTATION: [Shift; 3] = [Shift::First, Shift::Second, Shift::Off];

    pub fn as_i64(&self) -> i64 {
        match self {
            Shift::Off => 0,
            Shift::First => 1,
            Shift::Second => 2,
        }
    }

    pub fn from_i64(value: i64) -> Result<Self, ParseChoiceError> {
        match value {
            0 => Ok(Shift::Off),
            1 => Ok(Shift::First),
            2 => Ok(Shift::Second),
            other => Err(ParseChoiceError::new("shift", &other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Shift::Off => "Stop",
            Shift::First => "Shift 1",
            Shift::Second => "Shift 2",
        }
    }
}

impl From<Shift> for i64 {
    fn from(shift: Shift) -> Self {
        shift.as_i64()
    }
}

impl TryFrom<i64> for Shift {
    type Error = ParseChoiceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Shift::from_i64(value)
    }
}

/// Validation state shared by activity and analysis reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Approved => "approved",
            ReportStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::Approved => "Approved",
            ReportStatus::Rejected => "Rejected",
        }
    }

    pub fn is_validated(&self) -> bool {
        !matches!(self, ReportStatus::Pending)
    }
}

impl FromStr for ReportStatus {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "approved" => Ok(ReportStatus::Approved),
            "rejected" => Ok(ReportStatus::Rejected),
            other => Err(ParseChoiceError::new("status", other)),
        }
    }
}

/// Scheduled / unscheduled / accident classification of an activity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityCode {
    Sc,
    Usc,
    Acd,
}

impl ActivityCode {
    pub const ALL: [ActivityCode; 3] = [ActivityCode::Sc, ActivityCode::Usc, ActivityCode::Acd];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityCode::Sc => "SC",
            ActivityCode::Usc => "USC",
            ActivityCode::Acd => "ACD",
        }
    }
}

impl FromStr for ActivityCode {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityCode::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseChoiceError::new("activity code", s))
    }
}

/// Component codes of the mechanic activity form, with their printed labels.
pub const COMPONENTS: &[(&str, &str)] = &[
    ("Component_1", "Engine"),
    ("Component_2", "Clutch - Couper"),
    ("Component_3", "PTO"),
    ("Component_4", "Transmisi"),
    ("Component_5", "Final Drive"),
    ("Component_6", "Travel - Axle"),
    ("Component_7", "Steering"),
    ("Component_8", "Under Carriage"),
    ("Component_9", "Wheel"),
    ("Component_10", "Frame & Guard"),
    ("Component_11", "Electric"),
    ("Component_12", "Brake"),
    ("Component_13", "Suspension"),
    ("Component_14", "Hydraulic"),
    ("Component_15", "Pneumatic"),
    ("Component_16", "Swing System"),
    ("Component_17", "Attachment"),
    ("Component_18", "GET"),
    ("Component_19", "Vessel Assy"),
    ("Component_20", "Generating Set"),
    ("Component_21", "Dewatering Pump"),
    ("Component_22", "Optional Accessories"),
    ("Component_23", "Tank & Piping"),
    ("Component_24", "AC"),
    ("Component_25", "Stone Crusher"),
    ("Component_26", "Daily Maintenance"),
    ("Component_27", "12 Mounth Service"),
    ("Component_28", "6 Mounth Service"),
    ("Component_29", "90 Days Service"),
    ("Component_30", "30 Days Service"),
    ("Component_31", "10 Dayts Service"),
    ("Component_32", "PPA"),
    ("Component_33", "PPU"),
    ("Component_34", "PPM"),
    ("Component_35", "PAP"),
    ("Component_36", "4000 Hour Service"),
    ("Component_37", "2000 Hour Service"),
    ("Component_38", "1000 Hour Service"),
    ("Component_39", "500 Hour Service"),
    ("Component_40", "250 Hour Service"),
    ("Component_41", "100 Hour Service (Inisial)"),
    ("Component_42", "50 Hour Service (inisial)"),
    ("Component_43", "100 Hour Dialy Check"),
    ("Component_44", "Component Overhaul"),
    ("Component_45", "Component Midlive"),
    ("Component_46", "20.000 KM Service"),
    ("Component_47", "15.000 KM Service"),
    ("Component_48", "10.000 KM Service"),
    ("Component_49", "5.000 KM Service"),
    ("Component_50", "2.500 KM Service"),
];

/// Equipment sections selectable on the analysis report.
pub const SECTION_TRACKS: &[&str] = &[
    "PC1250",
    "CAT395",
    "DX800",
    "PC500",
    "PC300",
    "PC200/210",
    "D375",
    "D155",
    "D85",
    "EPIROC DM30",
    "HD785",
    "VOLVO FMX400",
    "GD955",
    "GD535",
    "GD160K/M",
    "DYNAPAC COMPACTOR",
    "HD465/WT",
    "RENAULT FT/LB",
    "HINO WT/LT/CT",
    "MANITAOU",
    "KATO CRANE",
    "GENSET",
    "WATER PUMP (WP)",
    "HINO DT",
    "MERCY DT",
    "BOMAG COMPACTOR",
];

/// Problem group codes of the analysis report.
pub const PROBLEMS: &[(&str, &str)] = &[
    ("1000", "Engine"),
    ("2000", "Clutch System"),
    ("3000", "Transmission"),
    ("4000", "Travel Dive-Axle"),
    ("5000", "Steering"),
    ("6000", "Undercariage"),
    ("7000", "Electric"),
    ("8000", "Attachment"),
    ("9000", "Periodical Services"),
];

/// Looks up the printed label of a code in one of the choice tables.
pub fn label_of(table: &[(&'static str, &'static str)], code: &str) -> Option<&'static str> {
    table.iter().find(|(c, _)| *c == code).map(|(_, label)| *label)
}
