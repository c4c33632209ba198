pub mod answer_grid;
pub mod error_list;
pub mod menu;
pub mod notice;
pub mod ranking;
pub mod results;
pub mod time_bar;
