//! Client-side tools for the table-side menu server.
//!
//! * [`client::MenuClient`] speaks the server's HTTP API and opens its live order feed.
//! * [`cart::Cart`] is the customer's view-model: pick products, then check out into an order request.
//! * [`order_board::OrderBoard`] is the staff view-model: an order list that is re-fetched whenever the feed reports
//!   a change.
pub mod cart;
pub mod client;
pub mod formatting;
pub mod order_board;
pub mod sse;
