//! Repository trait definitions for the relational store.

pub mod ownership;
