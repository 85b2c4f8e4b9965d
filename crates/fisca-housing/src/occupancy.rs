//! Housing occupancy status codes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the household occupies its dwelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyStatus {
    /// First-time buyer repaying a loan.
    FirstTimeBuyer,
    Owner,
    /// Tenant of subsidized (social) housing.
    SubsidizedTenant,
    Tenant,
    FurnishedTenant,
    /// Lodged free of charge.
    FreeLodging,
    HostelResident,
    /// Not provided or not a known code.
    Unknown,
}

impl OccupancyStatus {
    /// Decode the numeric status code.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::FirstTimeBuyer,
            2 => Self::Owner,
            3 => Self::SubsidizedTenant,
            4 => Self::Tenant,
            5 => Self::FurnishedTenant,
            6 => Self::FreeLodging,
            7 => Self::HostelResident,
            _ => Self::Unknown,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::FirstTimeBuyer => 1,
            Self::Owner => 2,
            Self::SubsidizedTenant => 3,
            Self::Tenant => 4,
            Self::FurnishedTenant => 5,
            Self::FreeLodging => 6,
            Self::HostelResident => 7,
            Self::Unknown => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstTimeBuyer => "first_time_buyer",
            Self::Owner => "owner",
            Self::SubsidizedTenant => "subsidized_tenant",
            Self::Tenant => "tenant",
            Self::FurnishedTenant => "furnished_tenant",
            Self::FreeLodging => "free_lodging",
            Self::HostelResident => "hostel_resident",
            Self::Unknown => "unknown",
        }
    }

    /// Statuses that receive the rental benefit.
    pub fn is_tenant(&self) -> bool {
        matches!(
            self,
            Self::SubsidizedTenant | Self::Tenant | Self::FurnishedTenant | Self::HostelResident
        )
    }

    pub fn is_furnished(&self) -> bool {
        matches!(self, Self::FurnishedTenant)
    }

    /// Marker for statuses whose benefit this pipeline cannot compute:
    /// 1 for first-time buyers, 2 for hostel residents, 0 otherwise.
    pub fn not_computable_code(&self) -> i64 {
        match self {
            Self::FirstTimeBuyer => 1,
            Self::HostelResident => 2,
            _ => 0,
        }
    }
}

impl fmt::Display for OccupancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
