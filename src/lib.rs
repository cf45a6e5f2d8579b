//! A page buffer cache for disk-backed storage: a fixed pool of frames
//! staging pages of page files, replaced with the clock algorithm.

pub mod error;

pub mod storage;

pub mod config;
