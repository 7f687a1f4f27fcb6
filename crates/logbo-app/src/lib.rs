// Application layer and bootstrap shared by the `logbo` bot and the
// `logbo-import` backfill binary.

pub mod application;
pub mod presentation;
