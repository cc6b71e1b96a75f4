//! HTML rendering for the index and product pages.

use client::types::{BookDetails, Product, Review};

use crate::reviews::UNKNOWN_STARS;

/// Stars on the rating scale.
pub const MAX_STARS: usize = 5;

/// A component in the topology table of the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceNode {
    pub name: &'static str,
    pub children: Vec<ServiceNode>,
}

impl ServiceNode {
    fn leaf(name: &'static str) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }
}

pub fn topology() -> ServiceNode {
    ServiceNode {
        name: "ProductPage",
        children: vec![
            ServiceNode::leaf("Details"),
            ServiceNode {
                name: "Reviews",
                children: vec![ServiceNode::leaf("Ratings")],
            },
        ],
    }
}

pub fn render_service_table(root: &ServiceNode) -> String {
    format!(
        "<table class='table table-condensed table-bordered table-hover'>\
         <thead><tr><th>Name</th><th>Endpoint</th><th>Children</th></tr></thead>\
         <tbody>{}</tbody></table>",
        render_service_row(root)
    )
}

fn render_service_row(node: &ServiceNode) -> String {
    let children = if node.children.is_empty() {
        "None".to_string()
    } else {
        let rows: String = node.children.iter().map(render_service_row).collect();
        format!("<table>{rows}</table>")
    };
    format!(
        "<tr><td>{}</td><td>Interno</td><td>{children}</td></tr>",
        escape_html(node.name)
    )
}

pub fn render_index(root: &ServiceNode) -> String {
    page(
        "Simple Bookstore App",
        &format!(
            r#"<h3>Hello! This is a simple bookstore application consisting of three services as shown below</h3>
{table}
<p><a href="/productpage">Normal user</a></p>
<p><a href="/productpage?u=test">Test user</a></p>"#,
            table = render_service_table(root)
        ),
    )
}

/// A review as shown on the product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewView {
    pub reviewer: String,
    pub text: String,
    pub stars: StarsView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StarsView {
    /// Filled and empty star counts, summing to [`MAX_STARS`].
    Rated {
        full: usize,
        empty: usize,
        color: String,
    },
    /// The ratings lookup failed; shows the color text instead.
    Unavailable(String),
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        let stars = if review.rating.stars == UNKNOWN_STARS {
            StarsView::Unavailable(review.rating.color.clone())
        } else {
            let full = usize::try_from(review.rating.stars)
                .unwrap_or(0)
                .min(MAX_STARS);
            StarsView::Rated {
                full,
                empty: MAX_STARS - full,
                color: review.rating.color.clone(),
            }
        };
        Self {
            reviewer: review.reviewer.clone(),
            text: review.text.clone(),
            stars,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPageView {
    pub product: Product,
    pub details: BookDetails,
    pub reviews: Vec<ReviewView>,
}

impl ProductPageView {
    pub fn new(product: Product, details: BookDetails, reviews: &[Review]) -> Self {
        Self {
            product,
            details,
            reviews: reviews.iter().map(ReviewView::from).collect(),
        }
    }
}

pub fn render_product_page(view: &ProductPageView) -> String {
    let details = &view.details;
    let rows = [
        ("Type", details.kind.clone()),
        ("Pages", details.pages.to_string()),
        ("Publisher", details.publisher.clone()),
        ("Language", details.language.clone()),
        ("ISBN-10", details.isbn_10.clone()),
        ("ISBN-13", details.isbn_13.clone()),
    ];
    let details_rows: String = rows
        .iter()
        .map(|(label, value)| {
            format!(
                "<dt>{}:</dt><dd>{}</dd>",
                escape_html(label),
                escape_html(value)
            )
        })
        .collect();

    let reviews: String = view.reviews.iter().map(render_review).collect();

    // description_html is trusted catalog markup
    page(
        &view.product.title,
        &format!(
            r#"<div class="row">
  <div class="col-md-12">
    <h3 class="text-center text-primary">{title}</h3>
    <p>Summary: {description}</p>
  </div>
</div>
<div class="row">
  <div class="col-md-6">
    <h4 class="text-center text-primary">Book Details</h4>
    <p>{author}, {year}</p>
    <dl>{details_rows}</dl>
  </div>
  <div class="col-md-6">
    <h4 class="text-center text-primary">Book Reviews</h4>
    {reviews}
  </div>
</div>"#,
            title = escape_html(&view.product.title),
            description = view.product.description_html,
            author = escape_html(&details.author),
            year = details.year,
        ),
    )
}

fn render_review(review: &ReviewView) -> String {
    let stars = match &review.stars {
        StarsView::Rated { full, empty, color } => format!(
            r#"<font color="{color}">{filled}{hollow}</font>"#,
            color = escape_html(color),
            filled = r#"<span class="glyphicon glyphicon-star"></span>"#.repeat(*full),
            hollow = r#"<span class="glyphicon glyphicon-star-empty"></span>"#.repeat(*empty),
        ),
        StarsView::Unavailable(text) => {
            format!(r#"<font color="red">{}</font>"#, escape_html(text))
        }
    };
    format!(
        r#"<blockquote>
  <p>{text}</p>
  <small>{reviewer}</small>
  {stars}
</blockquote>"#,
        text = escape_html(&review.text),
        reviewer = escape_html(&review.reviewer),
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<div class="container-fluid">
{body}
</div>
</body>
</html>"#,
        title = escape_html(title),
    )
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
