#![cfg(not(doctest))]

#[macro_use]
extern crate diesel;

pub mod db;
pub mod geocoding;
pub mod models;
pub mod request_io;
pub mod schema;
pub mod token;
pub mod validators;
