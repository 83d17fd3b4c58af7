use anyhow::{anyhow, Result};
use menu_engine::db_types::{Money, NewOrder, NewOrderItem, PaymentMethod, Product};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

/// What a table has picked from the menu so far. Lines keep the order in which products were first added.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one of `product`, or bumps the quantity if it is already in the cart.
    pub fn add(&mut self, product: &Product) -> Result<()> {
        self.add_quantity(product, 1)
    }

    pub fn add_quantity(&mut self, product: &Product, quantity: i64) -> Result<()> {
        if !product.in_stock {
            return Err(anyhow!("{} is out of stock", product.name));
        }
        if quantity <= 0 {
            return Err(anyhow!("Quantity must be a positive integer"));
        }
        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                quantity,
            }),
        }
        Ok(())
    }

    /// Takes one of the product out of the cart. The line goes when its quantity reaches zero.
    pub fn remove(&mut self, product_id: i64) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity -= 1;
        }
        self.lines.retain(|l| l.quantity > 0);
    }

    /// Sets the quantity of a product that is already in the cart. Zero or less removes it.
    pub fn set_quantity(&mut self, product_id: i64, quantity: i64) -> Result<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| anyhow!("Product {product_id} is not in the cart"))?;
        line.quantity = quantity;
        self.lines.retain(|l| l.quantity > 0);
        Ok(())
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Builds the order request for the cart's contents. The cart itself is left alone; clear it once the order has
    /// been accepted.
    pub fn checkout(&self, table_number: i64, payment_method: PaymentMethod, info: Option<String>) -> Result<NewOrder> {
        if self.is_empty() {
            return Err(anyhow!("The cart is empty"));
        }
        if table_number <= 0 {
            return Err(anyhow!("Table number must be a positive integer"));
        }
        let order = self.lines.iter().fold(NewOrder::new(table_number, payment_method), |order, l| {
            order.with_item(NewOrderItem::new(l.product_id, l.name.clone(), l.price, l.quantity))
        });
        let order = match info.filter(|s| !s.trim().is_empty()) {
            Some(info) => order.with_additional_info(info),
            None => order,
        };
        Ok(order)
    }
}
