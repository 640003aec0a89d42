use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use tl_cards::{enumerate_beats, Card, Combination, Play, Standing};
use tl_core::BOT_DECISION_DELAY_MS;

use super::{Decision, Player};

/// Bot skill tier. Easy picks at random among legal plays, Medium always
/// plays the weakest legal option, Hard reasons about preserving twos and
/// chop material for later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn random() -> Self {
        match rand::rng().random_range(0..3) {
            0 => Difficulty::Easy,
            1 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }
}

/// Display names handed to freshly created bot seats, cycling once
/// exhausted. Borrowed identity, not used for anything but the roster.
pub const BOT_NAMES: &[&str] = &[
    "Bot_Alpha", "Bot_Bravo", "Bot_Charlie", "Bot_Delta", "Bot_Echo", "Bot_Foxtrot",
    "Bot_Golf", "Bot_Hotel", "Bot_India", "Bot_Juliet", "Bot_Kilo", "Bot_Lima",
    "Bot_Mike", "Bot_November", "Bot_Oscar", "Bot_Papa", "Bot_Quebec", "Bot_Romeo",
    "Bot_Sierra", "Bot_Tango", "Bot_Uniform", "Bot_Victor", "Bot_Whiskey", "Bot_Xray",
    "Bot_Yankee", "Bot_Zulu", "Bot_Ace", "Bot_King", "Bot_Queen", "Bot_Jack",
    "Bot_Ten", "Bot_Nine", "Bot_Eight", "Bot_Seven", "Bot_Six", "Bot_Five",
    "Bot_Four", "Bot_Three", "Bot_Two", "Bot_Dragon", "Bot_Phoenix", "Bot_Tiger",
    "Bot_Falcon", "Bot_Wolf", "Bot_Raven", "Bot_Cobra", "Bot_Viper", "Bot_Master",
];

/// Strength of a candidate play: the comparison key of its highest card.
/// Higher means harder for the next player to beat.
fn combo_strength(play: &Play) -> u8 {
    play.cards.iter().map(Card::key).max().expect("non-empty play")
}

fn weakest<'a>(plays: &'a [Play]) -> &'a Play {
    plays.iter().min_by_key(|p| combo_strength(p)).expect("non-empty candidates")
}

fn strongest<'a>(plays: &'a [Play]) -> &'a Play {
    plays.iter().max_by_key(|p| combo_strength(p)).expect("non-empty candidates")
}

fn burns_a_two(play: &Play) -> bool {
    play.cards.iter().any(|c| c.rank() == tl_cards::Rank::Two)
}

/// Hard-mode lead selection: prefers the longest sequence/double-sequence
/// available, since those are hardest for a human to hold a counter to,
/// before falling back to the weakest plain group.
fn pick_smart_opening(candidates: &[Play]) -> &Play {
    candidates
        .iter()
        .filter(|p| matches!(p.combo, Combination::Sequence | Combination::DoubleSequence))
        .max_by_key(|p| p.cards.len())
        .unwrap_or_else(|| weakest(candidates))
}

fn choose_opening(hand: &[Card], difficulty: Difficulty) -> Decision {
    let candidates = enumerate_beats(hand, None);
    let chosen = match difficulty {
        Difficulty::Easy => {
            let idx = rand::rng().random_range(0..candidates.len());
            &candidates[idx]
        }
        Difficulty::Medium => weakest(&candidates),
        Difficulty::Hard => pick_smart_opening(&candidates),
    };
    Decision::Play(chosen.cards.clone(), chosen.combo)
}

/// Hard-mode beat selection: if the hand is nearly empty, go for the win
/// with the strongest beat available. Otherwise prefer a candidate that
/// doesn't spend a two; if the hand still has room to spare, fall back to
/// the weakest beat rather than over-committing. A bare hand with only
/// two-burning beats passes instead, banking the twos for a later chop.
fn pick_smart_beat(hand: &[Card], candidates: &[Play]) -> Decision {
    if hand.len() <= 3 {
        let play = strongest(candidates);
        return Decision::Play(play.cards.clone(), play.combo);
    }
    if let Some(play) = candidates.iter().find(|p| !burns_a_two(p)) {
        return Decision::Play(play.cards.clone(), play.combo);
    }
    if hand.len() <= 5 {
        let play = weakest(candidates);
        return Decision::Play(play.cards.clone(), play.combo);
    }
    Decision::Pass
}

fn choose_beat(hand: &[Card], table: &Standing, difficulty: Difficulty) -> Decision {
    let candidates = enumerate_beats(hand, Some(table));
    if candidates.is_empty() {
        return Decision::Pass;
    }
    match difficulty {
        Difficulty::Easy => {
            let idx = rand::rng().random_range(0..candidates.len());
            let play = &candidates[idx];
            Decision::Play(play.cards.clone(), play.combo)
        }
        Difficulty::Medium => {
            let play = weakest(&candidates);
            Decision::Play(play.cards.clone(), play.combo)
        }
        Difficulty::Hard => pick_smart_beat(hand, &candidates),
    }
}

/// Chooses a play for the current turn. An empty table means this seat
/// must lead, so only `choose_opening` can ever return `Decision::Pass`'s
/// opposite guarantee: a lead is never a pass.
pub fn choose_play(hand: &[Card], table: Option<&Standing>, difficulty: Difficulty) -> Decision {
    match table {
        None => choose_opening(hand, difficulty),
        Some(table) => choose_beat(hand, table, difficulty),
    }
}

/// An automated seat. Mirrors a human player's pace by sleeping a random
/// delay before responding, so bots don't feel instantaneous.
pub struct BotPlayer {
    pub user_id: i64,
    pub username: String,
    pub difficulty: Difficulty,
}

impl BotPlayer {
    pub fn new(user_id: i64, username: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            user_id,
            username: username.into(),
            difficulty,
        }
    }
}

#[async_trait]
impl Player for BotPlayer {
    async fn decide(&self, hand: &[Card], table: Option<&Standing>) -> Decision {
        let (lo, hi) = BOT_DECISION_DELAY_MS;
        let delay_ms = rand::rng().random_range(lo..=hi);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        choose_play(hand, table, self.difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_cards::{Rank, Suit};

    fn c(r: Rank, s: Suit) -> Card {
        Card::new(r, s)
    }

    #[test]
    fn medium_opening_always_leads() {
        let hand = vec![c(Rank::Three, Suit::Spades), c(Rank::Seven, Suit::Hearts)];
        match choose_opening(&hand, Difficulty::Medium) {
            Decision::Play(cards, _) => assert!(!cards.is_empty()),
            Decision::Pass => panic!("opening must never pass"),
        }
    }

    #[test]
    fn hard_beat_passes_when_only_option_burns_a_two_on_a_full_hand() {
        let hand: Vec<Card> = (0..8)
            .map(|i| Card::new(Rank::from(3 + i as u8), Suit::Spades))
            .chain(std::iter::once(c(Rank::Two, Suit::Hearts)))
            .collect();
        let table = Standing {
            cards: vec![c(Rank::Ace, Suit::Clubs)],
            combo: Combination::Single,
        };
        match choose_beat(&hand, &table, Difficulty::Hard) {
            Decision::Pass => {}
            Decision::Play(cards, _) => assert!(!burns_a_two(&Play { cards, combo: Combination::Single })),
        }
    }
}
