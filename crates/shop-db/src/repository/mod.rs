//! # Repository Implementations
//!
//! One repository per entity, each constructed from the pool and handed
//! out by accessors on [`crate::Database`]:
//!
//! - [`category`] - categories (delete detaches products via SET NULL)
//! - [`product`] - products, filtered listing, batch/bulk operations
//! - [`customer`] - customers (delete cascades to orders)
//! - [`order`] - orders and their line items
//!
//! All repositories follow the same contract: `create` validates
//! required fields before writing, `update` checks existence before the
//! write and honors a per-entity column whitelist, reads return
//! `Ok(None)`/empty rather than errors when nothing matches.

pub mod category;
pub mod customer;
pub mod order;
pub mod product;
