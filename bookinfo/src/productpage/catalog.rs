use client::types::Product;

/// The read-only product catalog, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn bookinfo() -> Self {
        Self::new(vec![Product {
            id: 0,
            title: "The Comedy of Errors".to_string(),
            description_html: concat!(
                r#"<a href="https://en.wikipedia.org/wiki/The_Comedy_of_Errors">Wikipedia Summary</a>: "#,
                "The Comedy of Errors is one of <b>William Shakespeare's</b> early plays. ",
                "It is his shortest and one of his most farcical comedies, with a major part of the humour ",
                "coming from slapstick and mistaken identity, in addition to puns and word play."
            )
            .to_string(),
        }])
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// The product whose title and description `/productpage` shows.
    pub fn featured(&self) -> Option<&Product> {
        self.products.first()
    }
}
