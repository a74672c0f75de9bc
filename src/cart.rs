use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{CartLine, Product},
};

/// Session cart: an ordered collection of lines, at most one per product id.
///
/// A repeat `add_once` of the same product is rejected, not merged; quantity
/// changes go through [`Cart::set_quantity`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_once(&mut self, product: Product) -> AppResult<()> {
        if self.contains(&product.id) {
            return Err(AppError::Validation(format!(
                "{} is already in the cart",
                product.name
            )));
        }
        self.lines.push(CartLine {
            product,
            quantity: 1,
        });
        Ok(())
    }

    /// Remove a line if present; absent ids are a no-op.
    pub fn remove(&mut self, product_id: &str) {
        self.lines.retain(|line| line.product.id != product_id);
    }

    pub fn set_quantity(&mut self, product_id: &str, quantity: i32) -> AppResult<()> {
        if quantity <= 0 {
            return Err(AppError::Validation(
                "quantity must be greater than 0; remove the item instead".to_string(),
            ));
        }
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.product.id == product_id)
            .ok_or(AppError::NotFound)?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total(&self) -> i64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.lines.iter().any(|line| line.product.id == product_id)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            price,
            stock: 10,
            category: "test".to_string(),
            description: String::new(),
            image: String::new(),
        }
    }

    #[test]
    fn add_once_rejects_duplicate_id() {
        let mut cart = Cart::new();
        cart.add_once(product("FOOD001", 50)).unwrap();
        let err = cart.add_once(product("FOOD001", 50)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn total_sums_price_times_quantity_regardless_of_order() {
        let mut a = Cart::new();
        a.add_once(product("A", 50)).unwrap();
        a.add_once(product("B", 30)).unwrap();
        a.set_quantity("A", 2).unwrap();

        let mut b = Cart::new();
        b.add_once(product("B", 30)).unwrap();
        b.add_once(product("A", 50)).unwrap();
        b.set_quantity("A", 2).unwrap();

        assert_eq!(a.total(), 130);
        assert_eq!(a.total(), b.total());
    }

    #[test]
    fn set_quantity_rejects_zero_and_unknown() {
        let mut cart = Cart::new();
        cart.add_once(product("A", 10)).unwrap();
        assert!(matches!(
            cart.set_quantity("A", 0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            cart.set_quantity("missing", 1),
            Err(AppError::NotFound)
        ));
        cart.set_quantity("A", 3).unwrap();
        assert_eq!(cart.total(), 30);
    }

    #[test]
    fn remove_is_noop_for_absent_id() {
        let mut cart = Cart::new();
        cart.add_once(product("A", 10)).unwrap();
        cart.remove("missing");
        assert_eq!(cart.len(), 1);
        cart.remove("A");
        assert!(cart.is_empty());
    }

    #[test]
    fn clear_empties_cart() {
        let mut cart = Cart::new();
        cart.add_once(product("A", 10)).unwrap();
        cart.add_once(product("B", 20)).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
    }
}
