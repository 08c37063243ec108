pub mod score_card;
pub mod snapshot;
