use std::fmt;

/// Longest age the input accepts, in digits
const MAX_AGE_DIGITS: usize = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Sex {
    #[default]
    Female,
    Male,
}

impl Sex {
    pub fn label(self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Sex::Female => Sex::Male,
            Sex::Male => Sex::Female,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fitzpatrick skin type, I (very fair) to VI (dark brown/black)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SkinType(u8);

impl SkinType {
    pub const ALL: [SkinType; 6] = [
        SkinType(1),
        SkinType(2),
        SkinType(3),
        SkinType(4),
        SkinType(5),
        SkinType(6),
    ];

    #[cfg(test)]
    pub fn new(id: u8) -> Option<Self> {
        (1..=6).contains(&id).then_some(SkinType(id))
    }

    pub fn id(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Type I (Very Fair)",
            2 => "Type II (Fair)",
            3 => "Type III (Medium)",
            4 => "Type IV (Olive)",
            5 => "Type V (Brown)",
            _ => "Type VI (Dark Brown/Black)",
        }
    }

    /// Next type, stopping at VI
    pub fn next(self) -> Self {
        SkinType((self.0 + 1).min(6))
    }

    /// Previous type, stopping at I
    pub fn prev(self) -> Self {
        SkinType((self.0 - 1).max(1))
    }
}

impl Default for SkinType {
    fn default() -> Self {
        SkinType(3)
    }
}

/// Personal details used to phrase the recommendation request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserProfile {
    /// Digits typed so far; empty until the user enters an age
    pub age: String,
    pub sex: Sex,
    pub skin_type: SkinType,
}

impl UserProfile {
    pub fn has_age(&self) -> bool {
        !self.age.is_empty()
    }

    /// Append a digit; anything else or a fourth digit is ignored.
    /// Returns true when the age changed.
    pub fn push_age_digit(&mut self, ch: char) -> bool {
        if ch.is_ascii_digit() && self.age.len() < MAX_AGE_DIGITS {
            self.age.push(ch);
            true
        } else {
            false
        }
    }

    pub fn pop_age_digit(&mut self) -> bool {
        self.age.pop().is_some()
    }
}
