//! Placed orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wtg_core::{Login, OrderId, ProductNumber};

/// One ordered product, as stored in the order snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: ProductNumber,
    pub name: String,
    pub quantity: u32,
}

/// A placed order.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub login: Login,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}
