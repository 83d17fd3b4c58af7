mod analytics;
mod auth;
mod helpers;
mod mocks;
mod orders;
mod products;
