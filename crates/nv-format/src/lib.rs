#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod bank;
pub mod legacy;

pub use bank::{decode, encode, BankImage};
