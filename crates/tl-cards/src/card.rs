use super::rank::Rank;
use super::suit::Suit;

/// A playing card: `(rank, suit)`. Its comparison key is `rank*4 + suit`,
/// giving a total order over the 52-card deck where rank dominates suit.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }
    pub fn rank(&self) -> Rank {
        self.rank
    }
    pub fn suit(&self) -> Suit {
        self.suit
    }
    /// Comparison key used for beat-relation and deck partitioning.
    pub fn key(&self) -> u8 {
        u8::from(self.rank) * 4 + u8::from(self.suit)
    }
    pub fn three_of_spades() -> Self {
        Self::new(Rank::Three, Suit::Spades)
    }
}

impl From<(Rank, Suit)> for Card {
    fn from((rank, suit): (Rank, Suit)) -> Self {
        Self { rank, suit }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Wire pair `{rank, suit}` as specified in the external interface.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CardPayload {
    pub rank: String,
    pub suit: String,
}

impl From<Card> for CardPayload {
    fn from(c: Card) -> Self {
        Self {
            rank: c.rank.to_string(),
            suit: c.suit.to_string(),
        }
    }
}

impl TryFrom<&CardPayload> for Card {
    type Error = String;
    fn try_from(p: &CardPayload) -> Result<Self, Self::Error> {
        let rank = Rank::try_from(p.rank.as_str())?;
        let suit = Suit::try_from(p.suit.as_str())?;
        Ok(Card::new(rank, suit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_orders_rank_before_suit() {
        let low = Card::new(Rank::Three, Suit::Hearts);
        let high = Card::new(Rank::Four, Suit::Spades);
        assert!(low.key() < high.key());
    }

    #[test]
    fn same_rank_breaks_by_suit() {
        let a = Card::new(Rank::Five, Suit::Spades);
        let b = Card::new(Rank::Five, Suit::Clubs);
        assert!(a.key() < b.key());
    }

    #[test]
    fn payload_round_trips() {
        let card = Card::new(Rank::Ten, Suit::Diamonds);
        let payload = CardPayload::from(card);
        assert_eq!(Card::try_from(&payload).unwrap(), card);
    }

    #[test]
    fn rejects_unknown_strings() {
        let payload = CardPayload {
            rank: "15".into(),
            suit: "X".into(),
        };
        assert!(Card::try_from(&payload).is_err());
    }
}
