/// Inclusive range of numeric ids handed out for new accounts.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IdRange {
    pub min: u32,
    pub max: u32,
}

impl IdRange {
    pub fn new(min: u32, max: u32) -> IdRange {
        IdRange { min, max }
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}
