#![allow(dead_code)]

pub mod tile_server;
