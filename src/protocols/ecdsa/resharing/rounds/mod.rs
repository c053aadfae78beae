pub mod round_1;
pub mod round_2;
pub mod round_3;
pub mod round_4;
