//! Utility modules for minixml.
//!
//! Contains the entity table and escaping rules shared by the loader and
//! the saver.

pub mod entity;
