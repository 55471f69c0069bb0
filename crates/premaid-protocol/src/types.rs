//! Servo identifiers, pages and named joints.

use std::fmt;

use crate::constants::SERVOS_PER_PAGE;
use crate::error::ProtocolError;

// ============================================================================
// Servo Identifier
// ============================================================================

/// One of the 32 servo identifier slots (0x00..=0x1F) on the board's bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServoId(u8);

impl ServoId {
    /// Number of identifier slots.
    pub const COUNT: usize = 32;

    /// Create an identifier, rejecting values outside the bus range.
    pub const fn new(raw: u8) -> Option<Self> {
        if (raw as usize) < Self::COUNT {
            Some(ServoId(raw))
        } else {
            None
        }
    }

    /// The identifier byte as sent on the wire.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Ordinal for array indexing.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Page this identifier is polled in.
    pub const fn page(self) -> Page {
        if (self.0 as usize) < SERVOS_PER_PAGE {
            Page::Low
        } else {
            Page::High
        }
    }

    /// The fitted joint using this identifier, if any.
    pub fn joint(self) -> Option<Joint> {
        Joint::from_id(self)
    }

    /// Every identifier slot in ascending order.
    pub fn all() -> impl Iterator<Item = ServoId> {
        (0..Self::COUNT as u8).map(ServoId)
    }
}

impl TryFrom<u8> for ServoId {
    type Error = ProtocolError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        ServoId::new(raw).ok_or(ProtocolError::InvalidServoId(raw))
    }
}

impl From<ServoId> for u8 {
    fn from(id: ServoId) -> Self {
        id.0
    }
}

impl fmt::Display for ServoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

// ============================================================================
// Page
// ============================================================================

/// Half of the identifier space, requested and reported as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// Identifiers 0x00..=0x0F (page 0).
    Low,
    /// Identifiers 0x10..=0x1F (page 1).
    High,
}

impl Page {
    /// Page number as used by consumers (0 or 1).
    pub const fn index(self) -> u8 {
        match self {
            Page::Low => 0,
            Page::High => 1,
        }
    }

    /// Page from its number.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Page::Low),
            1 => Some(Page::High),
            _ => None,
        }
    }

    /// The other page.
    pub const fn next(self) -> Self {
        match self {
            Page::Low => Page::High,
            Page::High => Page::Low,
        }
    }

    /// First identifier of the page; also the offset byte of a read request.
    pub const fn first_id(self) -> u8 {
        match self {
            Page::Low => 0x00,
            Page::High => 0x10,
        }
    }

    /// Whether the identifier belongs to this page.
    pub const fn contains(self, id: ServoId) -> bool {
        matches!(
            (self, id.page()),
            (Page::Low, Page::Low) | (Page::High, Page::High)
        )
    }

    /// The page's identifiers in wire order.
    pub fn ids(self) -> impl Iterator<Item = ServoId> {
        let first = self.first_id();
        (first..first + SERVOS_PER_PAGE as u8).map(ServoId)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

// ============================================================================
// Joints
// ============================================================================

/// The servos fitted to the robot, by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Joint {
    RightShoulderPitch = 0x02,
    HeadPitch = 0x03,
    LeftShoulderPitch = 0x04,
    HeadYaw = 0x05,
    RightHipYaw = 0x06,
    HeadRoll = 0x07,
    LeftHipYaw = 0x08,
    RightShoulderRoll = 0x09,
    RightHipRoll = 0x0A,
    LeftShoulderRoll = 0x0B,
    LeftHipRoll = 0x0C,
    RightUpperArmYaw = 0x0D,
    RightUpperLegPitch = 0x0E,
    LeftUpperArmYaw = 0x0F,
    LeftUpperLegPitch = 0x10,
    RightLowerArmPitch = 0x11,
    RightLowerLegPitch = 0x12,
    LeftLowerArmPitch = 0x13,
    LeftLowerLegPitch = 0x14,
    RightHandYaw = 0x15,
    RightFootPitch = 0x16,
    LeftHandYaw = 0x17,
    LeftFootPitch = 0x18,
    RightFootRoll = 0x1A,
    LeftFootRoll = 0x1C,
}

/// Encoder span corresponding to 135 degrees of travel.
const TICKS_PER_135_DEGREES: f32 = 4000.0;

impl Joint {
    /// All fitted joints in identifier order.
    pub const ALL: [Joint; 25] = [
        Joint::RightShoulderPitch,
        Joint::HeadPitch,
        Joint::LeftShoulderPitch,
        Joint::HeadYaw,
        Joint::RightHipYaw,
        Joint::HeadRoll,
        Joint::LeftHipYaw,
        Joint::RightShoulderRoll,
        Joint::RightHipRoll,
        Joint::LeftShoulderRoll,
        Joint::LeftHipRoll,
        Joint::RightUpperArmYaw,
        Joint::RightUpperLegPitch,
        Joint::LeftUpperArmYaw,
        Joint::LeftUpperLegPitch,
        Joint::RightLowerArmPitch,
        Joint::RightLowerLegPitch,
        Joint::LeftLowerArmPitch,
        Joint::LeftLowerLegPitch,
        Joint::RightHandYaw,
        Joint::RightFootPitch,
        Joint::LeftHandYaw,
        Joint::LeftFootPitch,
        Joint::RightFootRoll,
        Joint::LeftFootRoll,
    ];

    /// Bus identifier of this joint.
    pub const fn id(self) -> ServoId {
        ServoId(self as u8)
    }

    /// Joint fitted at an identifier, if any.
    pub fn from_id(id: ServoId) -> Option<Self> {
        Joint::ALL.iter().copied().find(|joint| joint.id() == id)
    }

    /// Calibrated encoder value at the model's rest pose.
    pub const fn neutral_position(self) -> i16 {
        match self {
            Joint::RightShoulderRoll => 9500,
            Joint::LeftShoulderRoll => 5500,
            _ => 7500,
        }
    }

    /// Joint angle in degrees, in (-180, 180], from a calibrated encoder value.
    pub fn angle_degrees(self, calibrated: i16) -> f32 {
        let ticks = f32::from(calibrated) - f32::from(self.neutral_position());
        let mut degrees = ticks * 135.0 / TICKS_PER_135_DEGREES;

        // Shoulder rolls rest with the arms lowered, not level.
        match self {
            Joint::LeftShoulderRoll => degrees -= 66.0,
            Joint::RightShoulderRoll => degrees += 66.0,
            _ => {}
        }

        degrees = degrees.rem_euclid(360.0);
        if degrees > 180.0 {
            degrees -= 360.0;
        }
        degrees
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
