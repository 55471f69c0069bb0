//! Last-known servo state, one record per tracked identifier.
//!
//! The store is owned by the receiver and only mutated from the poll loop's
//! thread. Consumers get shared references, never mutable ones.

use premaid_protocol::{Joint, Page, ServoId, ServoSample};

/// Last decoded state of one servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoRecord {
    id: ServoId,
    is_valid: bool,
    raw: i16,
    offset: i16,
    commanded: i16,
}

impl ServoRecord {
    /// A record with no reading yet.
    pub fn new(id: ServoId) -> Self {
        ServoRecord {
            id,
            is_valid: false,
            raw: 0,
            offset: 0,
            commanded: 0,
        }
    }

    /// Servo identifier.
    pub fn id(&self) -> ServoId {
        self.id
    }

    /// Fitted joint at this identifier, if any.
    pub fn joint(&self) -> Option<Joint> {
        self.id.joint()
    }

    /// Whether the board marked the last reading valid.
    ///
    /// Stays false until the first telemetry for this servo arrives.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Raw encoder value. Prefer [`calibrated`](Self::calibrated).
    pub fn raw(&self) -> i16 {
        self.raw
    }

    /// Calibration offset.
    pub fn offset(&self) -> i16 {
        self.offset
    }

    /// Commanded target; zero while torque is released.
    pub fn commanded(&self) -> i16 {
        self.commanded
    }

    /// Encoder value with the calibration offset removed.
    pub fn calibrated(&self) -> i16 {
        self.raw.wrapping_sub(self.offset)
    }

    /// Joint angle in degrees, for fitted joints with a valid reading.
    pub fn angle_degrees(&self) -> Option<f32> {
        if !self.is_valid {
            return None;
        }
        self.joint().map(|joint| joint.angle_degrees(self.calibrated()))
    }
}

/// Fixed table of servo records indexed by identifier ordinal.
#[derive(Debug, Clone)]
pub struct ServoStore {
    records: [Option<ServoRecord>; ServoId::COUNT],
}

impl Default for ServoStore {
    fn default() -> Self {
        Self::all_ids()
    }
}

impl ServoStore {
    /// Track the given identifiers, each starting invalid.
    pub fn new(ids: impl IntoIterator<Item = ServoId>) -> Self {
        let mut records = [None; ServoId::COUNT];
        for id in ids {
            records[id.index()] = Some(ServoRecord::new(id));
        }
        ServoStore { records }
    }

    /// Track all 32 identifier slots.
    pub fn all_ids() -> Self {
        Self::new(ServoId::all())
    }

    /// Track only the identifiers of fitted joints.
    pub fn joints_only() -> Self {
        Self::new(Joint::ALL.iter().map(|joint| joint.id()))
    }

    /// Overwrite a tracked record. Returns false for untracked identifiers.
    pub fn update(
        &mut self,
        id: ServoId,
        is_valid: bool,
        raw: i16,
        offset: i16,
        commanded: i16,
    ) -> bool {
        match &mut self.records[id.index()] {
            Some(record) => {
                record.is_valid = is_valid;
                record.raw = raw;
                record.offset = offset;
                record.commanded = commanded;
                true
            }
            None => false,
        }
    }

    /// Apply a decoded telemetry sample.
    pub fn apply(&mut self, sample: &ServoSample) -> bool {
        self.update(
            sample.id,
            sample.is_valid,
            sample.raw,
            sample.offset,
            sample.commanded,
        )
    }

    /// Record for an identifier, if tracked.
    pub fn get(&self, id: ServoId) -> Option<&ServoRecord> {
        self.records[id.index()].as_ref()
    }

    /// Record for a fitted joint, if tracked.
    pub fn get_joint(&self, joint: Joint) -> Option<&ServoRecord> {
        self.get(joint.id())
    }

    /// Whether an identifier is tracked.
    pub fn contains(&self, id: ServoId) -> bool {
        self.records[id.index()].is_some()
    }

    /// Tracked records in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ServoRecord> {
        self.records.iter().flatten()
    }

    /// Tracked records belonging to one page.
    pub fn page(&self, page: Page) -> impl Iterator<Item = &ServoRecord> {
        self.iter().filter(move |record| page.contains(record.id))
    }

    /// Number of tracked identifiers.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u8) -> ServoId {
        ServoId::new(raw).unwrap()
    }

    #[test]
    fn test_initial_records_invalid() {
        let store = ServoStore::all_ids();
        assert_eq!(store.len(), 32);
        assert!(store.iter().all(|r| !r.is_valid() && r.raw() == 0));
    }

    #[test]
    fn test_update_and_get() {
        let mut store = ServoStore::all_ids();
        assert!(store.update(id(0x05), true, 7600, 100, 7500));

        let record = store.get(id(0x05)).unwrap();
        assert!(record.is_valid());
        assert_eq!(record.raw(), 7600);
        assert_eq!(record.offset(), 100);
        assert_eq!(record.commanded(), 7500);
        assert_eq!(record.calibrated(), 7500);
        assert_eq!(record.angle_degrees(), Some(0.0));
    }

    #[test]
    fn test_calibrated_wraps() {
        let mut store = ServoStore::all_ids();
        store.update(id(0x02), true, i16::MIN, 1, 0);
        assert_eq!(store.get(id(0x02)).unwrap().calibrated(), i16::MAX);
    }

    #[test]
    fn test_untracked_ignored() {
        let mut store = ServoStore::joints_only();
        assert_eq!(store.len(), 25);
        assert!(!store.contains(id(0x00)));
        assert!(!store.update(id(0x00), true, 1, 2, 3));
        assert!(store.get(id(0x00)).is_none());
    }

    #[test]
    fn test_get_joint() {
        let mut store = ServoStore::joints_only();
        store.update(Joint::LeftFootRoll.id(), true, 42, 0, 0);
        assert_eq!(store.get_joint(Joint::LeftFootRoll).unwrap().raw(), 42);
    }

    #[test]
    fn test_page_view() {
        let store = ServoStore::joints_only();
        // Fitted joints 0x02..=0x0F on the low page, the rest high.
        assert_eq!(store.page(Page::Low).count(), 14);
        assert_eq!(store.page(Page::High).count(), 11);
    }

    #[test]
    fn test_angle_needs_valid_reading() {
        let store = ServoStore::joints_only();
        assert_eq!(store.get_joint(Joint::HeadYaw).unwrap().angle_degrees(), None);
    }
}
