pub mod analysis;
pub mod cost;
pub mod response;
pub mod run;
pub mod survey;
pub mod token_count;
