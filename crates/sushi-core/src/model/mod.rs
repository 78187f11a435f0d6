pub mod action;
pub mod card;
pub mod counts;
pub mod deck;
pub mod hand;
pub mod player;
pub mod score;
pub mod tableau;
