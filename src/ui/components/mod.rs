pub mod controls;
pub mod progress_bar;
pub mod question_card;
pub mod scoreboard;
pub mod stats_grid;
