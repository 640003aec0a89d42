use super::card::Card;
use super::rank::Rank;
use super::suit::Suit;
use rand::seq::SliceRandom;

/// A 52-card deck, shuffled with a uniform Fisher-Yates pass over a
/// strong random source.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new() -> Self {
        let mut cards = Vec::with_capacity(52);
        for rank in Rank::all() {
            for suit in Suit::all() {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    /// Shuffles in place using the thread-local CSPRNG-backed generator.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    /// Deals four 13-card hands, each sorted by comparison key.
    pub fn deal_four_hands(mut self) -> [Vec<Card>; 4] {
        self.shuffle();
        let mut hands: [Vec<Card>; 4] = Default::default();
        for (i, hand) in hands.iter_mut().enumerate() {
            *hand = self.cards[i * 13..(i + 1) * 13].to_vec();
            hand.sort_by_key(Card::key);
        }
        hands
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deal_partitions_the_full_deck() {
        let deck = Deck::new();
        let hands = deck.deal_four_hands();
        let total: usize = hands.iter().map(|h| h.len()).sum();
        assert_eq!(total, 52);
        let mut all: Vec<Card> = hands.into_iter().flatten().collect();
        all.sort_by_key(Card::key);
        all.dedup();
        assert_eq!(all.len(), 52);
    }

    #[test]
    fn each_hand_is_sorted() {
        let hands = Deck::new().deal_four_hands();
        for hand in hands {
            assert!(hand.windows(2).all(|w| w[0].key() <= w[1].key()));
        }
    }
}
