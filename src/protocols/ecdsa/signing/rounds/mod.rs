pub mod round_1;
pub mod round_2;
pub mod round_3;
pub mod round_4;
pub mod round_5;
pub mod round_6;
pub mod round_7;
pub mod round_8;
pub mod round_9;
pub mod round_10;
