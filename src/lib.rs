//! Crawler for the public Mastodon/Pleroma REST surface. Starting from a
//! seed instance it discovers instances, accounts and toots through
//! unauthenticated endpoints and accumulates the observation edges between
//! accounts (boosts, favourites, replies, threads) in a checkpointable
//! store.

pub mod crawler;
pub mod health;
pub mod model;
pub mod parse;
pub mod rest;
pub mod store;
