//! 3GPP facility codes for call barring (TS 27.007 +CLCK)

use cbar_core::BarringCategory;

pub mod code {
    pub const BAOC: &str = "AO";
    pub const BAOIC: &str = "OI";
    pub const BAOICX_H: &str = "OX";
    pub const BAIC: &str = "AI";
    pub const BAIC_R: &str = "IR";
    pub const BA_ALL: &str = "AB";
}

/// Facility code for a category
pub fn facility_code(category: BarringCategory) -> &'static str {
    match category {
        BarringCategory::OutgoingAllCalls => code::BAOC,
        BarringCategory::OutgoingInternational => code::BAOIC,
        BarringCategory::OutgoingInternationalExceptHome => code::BAOICX_H,
        BarringCategory::IncomingAll => code::BAIC,
        BarringCategory::IncomingWhenRoaming => code::BAIC_R,
        BarringCategory::AllBarring => code::BA_ALL,
    }
}

/// Category for a facility code (case-insensitive)
pub fn from_facility_code(code: &str) -> Option<BarringCategory> {
    match code.to_ascii_uppercase().as_str() {
        code::BAOC => Some(BarringCategory::OutgoingAllCalls),
        code::BAOIC => Some(BarringCategory::OutgoingInternational),
        code::BAOICX_H => Some(BarringCategory::OutgoingInternationalExceptHome),
        code::BAIC => Some(BarringCategory::IncomingAll),
        code::BAIC_R => Some(BarringCategory::IncomingWhenRoaming),
        code::BA_ALL => Some(BarringCategory::AllBarring),
        _ => None,
    }
}
