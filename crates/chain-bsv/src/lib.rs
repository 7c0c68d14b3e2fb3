//! Bitcoin SV chain support for the wallet.
//!
//! Provides P2PKH address handling, the UTXO model and balance aggregation,
//! largest-first coin selection, fee estimation, transaction assembly
//! (payment, `OP_RETURN` marker/data outputs, change) and
//! `SIGHASH_ALL | FORKID` signing. Everything here is pure: no I/O, no clocks.

pub mod address;
pub mod balance;
pub mod error;
pub mod network;
pub mod transaction;
pub mod utxo;
