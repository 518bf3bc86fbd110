pub const TAG_LEN: usize = 8;

pub const HISTORICAL_RECORD_TAG: [u8; TAG_LEN] = [113, 149, 127, 152, 8, 133, 183, 233];

/// Allocated size of a historical record account:
/// tag 8, author 32, two timestamps 16, topic 54, description 284,
/// category 24, source url 104.
pub const HISTORICAL_RECORD_SIZE: usize = 522;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountSchema {
    HistoricalRecord,
}

impl AccountSchema {
    pub const ALL: [AccountSchema; 1] = [AccountSchema::HistoricalRecord];

    pub const fn tag(self) -> &'static [u8; TAG_LEN] {
        match self {
            Self::HistoricalRecord => &HISTORICAL_RECORD_TAG,
        }
    }

    pub const fn size(self) -> usize {
        match self {
            Self::HistoricalRecord => HISTORICAL_RECORD_SIZE,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::HistoricalRecord => "HistoricalRecord",
        }
    }

    pub fn matches(self, bytes: &[u8]) -> bool {
        bytes.len() >= TAG_LEN && bytes[..TAG_LEN] == self.tag()[..]
    }

    pub fn identify(bytes: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|schema| schema.matches(bytes))
    }
}

pub fn matches(bytes: &[u8]) -> bool {
    AccountSchema::HistoricalRecord.matches(bytes)
}
