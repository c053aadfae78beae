// Translation of tss-lib-go/crypto/vss/feldman_vss.go

mod feldman_vss;

pub use feldman_vss::*;
