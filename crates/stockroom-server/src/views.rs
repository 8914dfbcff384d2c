//! HTML pages, rendered with Tera from templates compiled into the binary.

use stockroom_core::{HistoryEntry, Product, StockStats};
use tera::{Context, Tera};

pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", include_str!("../templates/base.html")),
            ("products.html", include_str!("../templates/products.html")),
            ("sold.html", include_str!("../templates/sold.html")),
            ("clinic.html", include_str!("../templates/clinic.html")),
        ])?;
        Ok(Self { tera })
    }

    pub fn products(&self, products: &[Product], stats: &StockStats) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("products", products);
        context.insert("stats", stats);
        self.tera.render("products.html", &context)
    }

    pub fn sold(&self, entries: &[HistoryEntry]) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("entries", entries);
        self.tera.render("sold.html", &context)
    }

    pub fn clinic(&self, entries: &[HistoryEntry]) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("entries", entries);
        self.tera.render("clinic.html", &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_page_escapes_names() {
        let views = Views::new().unwrap();
        let products = vec![Product {
            id: 1,
            name: "<b>Aspirin</b>".into(),
            quantity: 4,
        }];
        let html = views.products(&products, &StockStats::default()).unwrap();

        assert!(html.contains("&lt;b&gt;Aspirin&lt;&#x2F;b&gt;"));
        assert!(!html.contains("<b>Aspirin</b>"));
    }

    #[test]
    fn test_products_page_has_stock_forms() {
        let views = Views::new().unwrap();
        let html = views.products(&[], &StockStats::default()).unwrap();

        assert!(html.contains(r#"data-endpoint="/api/add_product""#));
        assert!(html.contains(r#"data-endpoint="/api/sell_product""#));
        assert!(html.contains(r#"data-endpoint="/api/send_to_clinic""#));
        assert!(html.contains("/api/search_products?q="));
    }

    #[test]
    fn test_empty_history_pages() {
        let views = Views::new().unwrap();
        assert!(views.sold(&[]).unwrap().contains("No sales recorded"));
        assert!(views
            .clinic(&[])
            .unwrap()
            .contains("Nothing sent to the clinic yet"));
    }
}
