use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of cards in a full Sushi Go! deck.
pub const DECK_SIZE: u32 = 108;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CardType {
    #[serde(rename = "tempura")]
    Tempura = 0,
    #[serde(rename = "sashimi")]
    Sashimi = 1,
    #[serde(rename = "dumpling")]
    Dumpling = 2,
    #[serde(rename = "maki-1")]
    MakiRoll1 = 3,
    #[serde(rename = "maki-2")]
    MakiRoll2 = 4,
    #[serde(rename = "maki-3")]
    MakiRoll3 = 5,
    #[serde(rename = "salmon-nigiri")]
    SalmonNigiri = 6,
    #[serde(rename = "squid-nigiri")]
    SquidNigiri = 7,
    #[serde(rename = "egg-nigiri")]
    EggNigiri = 8,
    #[serde(rename = "pudding")]
    Pudding = 9,
    #[serde(rename = "wasabi")]
    Wasabi = 10,
    #[serde(rename = "chopsticks")]
    Chopsticks = 11,
}

impl CardType {
    pub const COUNT: usize = 12;

    pub const ALL: [CardType; CardType::COUNT] = [
        CardType::Tempura,
        CardType::Sashimi,
        CardType::Dumpling,
        CardType::MakiRoll1,
        CardType::MakiRoll2,
        CardType::MakiRoll3,
        CardType::SalmonNigiri,
        CardType::SquidNigiri,
        CardType::EggNigiri,
        CardType::Pudding,
        CardType::Wasabi,
        CardType::Chopsticks,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical number of copies of this type in a full deck.
    pub const fn total_copies(self) -> u32 {
        match self {
            CardType::Tempura | CardType::Sashimi | CardType::Dumpling => 14,
            CardType::MakiRoll2 => 12,
            CardType::MakiRoll3 => 8,
            CardType::MakiRoll1 => 6,
            CardType::SalmonNigiri | CardType::Pudding => 10,
            CardType::SquidNigiri | CardType::EggNigiri => 5,
            CardType::Wasabi => 6,
            CardType::Chopsticks => 4,
        }
    }

    /// Maki icons printed on the card (zero for non-maki cards).
    pub const fn maki_icons(self) -> u32 {
        match self {
            CardType::MakiRoll1 => 1,
            CardType::MakiRoll2 => 2,
            CardType::MakiRoll3 => 3,
            _ => 0,
        }
    }

    pub const fn is_maki(self) -> bool {
        self.maki_icons() > 0
    }

    /// Base value of a nigiri before any wasabi multiplier.
    pub const fn nigiri_value(self) -> Option<u32> {
        match self {
            CardType::SquidNigiri => Some(3),
            CardType::SalmonNigiri => Some(2),
            CardType::EggNigiri => Some(1),
            _ => None,
        }
    }

    pub const fn is_nigiri(self) -> bool {
        self.nigiri_value().is_some()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CardType::Tempura => "tempura",
            CardType::Sashimi => "sashimi",
            CardType::Dumpling => "dumpling",
            CardType::MakiRoll1 => "maki-1",
            CardType::MakiRoll2 => "maki-2",
            CardType::MakiRoll3 => "maki-3",
            CardType::SalmonNigiri => "salmon-nigiri",
            CardType::SquidNigiri => "squid-nigiri",
            CardType::EggNigiri => "egg-nigiri",
            CardType::Pudding => "pudding",
            CardType::Wasabi => "wasabi",
            CardType::Chopsticks => "chopsticks",
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardType {
    type Err = ParseCardTypeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        CardType::ALL
            .iter()
            .copied()
            .find(|card| card.as_str() == normalized)
            .ok_or_else(|| ParseCardTypeError(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCardTypeError(pub String);

impl fmt::Display for ParseCardTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown card type '{}'", self.0)
    }
}

impl std::error::Error for ParseCardTypeError {}
