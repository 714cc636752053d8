use serde::{Deserialize, Serialize};

/// A room that can host one exam at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classroom {
    /// Unique identifier, e.g. the room number.
    pub id: String,
    pub name: String,
    /// Seats available to examinees. Must be positive.
    pub capacity: usize,
}

impl Classroom {
    pub fn new(id: impl Into<String>, name: impl Into<String>, capacity: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
        }
    }

    pub fn fits(&self, student_count: usize) -> bool {
        student_count <= self.capacity
    }
}
