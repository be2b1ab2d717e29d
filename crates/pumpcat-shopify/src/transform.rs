//! Record → upload payload transformation.
//!
//! `transform` is a pure function of the record: the body HTML is assembled
//! in a fixed order from deterministic inputs, so transforming the same
//! record twice yields byte-identical output.

use pumpcat_core::{fallback_description, ProductRecord, FALLBACK_ADVANTAGES};

use crate::payload::{
    synthesize_sku, validate_image_url, UploadImage, UploadMetafield, UploadOption, UploadPayload,
    UploadVariant,
};

/// Descriptions at or below this trimmed length are treated as extraction
/// noise and replaced by the generic fallback sentence.
const MIN_DESCRIPTION_LEN: usize = 20;

/// Long-description blocks at or below this length are omitted from the body.
const MIN_LONG_DESCRIPTION_LEN: usize = 50;

const BRAND_PARAGRAPH: &str = "Wilo is a leading manufacturer of pumps and pump systems for \
heating, cooling, air conditioning, water supply and wastewater treatment.";

/// Projects a [`ProductRecord`] onto the create-product payload shape.
#[must_use]
pub fn transform(record: &ProductRecord) -> UploadPayload {
    UploadPayload {
        title: record.name.clone(),
        body_html: build_body_html(record),
        vendor: "Wilo".to_owned(),
        product_type: record.subcategory.clone(),
        tags: generate_tags(record),
        status: "draft".to_owned(),
        variants: vec![UploadVariant {
            title: "Standard".to_owned(),
            price: "0.00".to_owned(),
            inventory_management: "shopify".to_owned(),
            inventory_quantity: 0,
            requires_shipping: true,
            taxable: true,
            sku: synthesize_sku(&record.name),
        }],
        options: vec![UploadOption {
            name: "Title".to_owned(),
            values: vec!["Default".to_owned()],
        }],
        images: collect_images(record),
        metafields: collect_metafields(record),
    }
}

/// Assembles the product body HTML in fixed order: title, short description
/// (or its fallback), category/type lines, advantages list (real or the
/// generic feature list — never an empty `<ul>`), optional long-description
/// paragraphs, optional specifications, and the brand boilerplate.
#[must_use]
pub fn build_body_html(record: &ProductRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!("<h1>{}</h1>", record.name));

    let description = record.short_description.trim();
    if description.chars().count() > MIN_DESCRIPTION_LEN {
        parts.push(format!("<p>{description}</p>"));
    } else {
        parts.push(format!(
            "<p>{}</p>",
            fallback_description(&record.name, &record.category)
        ));
    }

    parts.push(format!(
        "<p><strong>Application:</strong> {}</p>",
        record.category
    ));
    parts.push(format!(
        "<p><strong>Product Type:</strong> {}</p>",
        record.subcategory
    ));

    let advantages: Vec<&str> = record
        .advantages
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();
    if advantages.is_empty() {
        parts.push("<h3>Key Features</h3>".to_owned());
        parts.push("<ul>".to_owned());
        for feature in FALLBACK_ADVANTAGES {
            parts.push(format!("<li>{feature}</li>"));
        }
        parts.push("</ul>".to_owned());
    } else {
        parts.push("<h3>Your Advantages</h3>".to_owned());
        parts.push("<ul>".to_owned());
        for advantage in advantages {
            parts.push(format!("<li>{advantage}</li>"));
        }
        parts.push("</ul>".to_owned());
    }

    let long = record.long_description.trim();
    if long.chars().count() > MIN_LONG_DESCRIPTION_LEN {
        for paragraph in long.split("\n\n") {
            let paragraph = paragraph.trim();
            if !paragraph.is_empty() {
                parts.push(format!("<p>{paragraph}</p>"));
            }
        }
    }

    if !record.specifications.is_empty() {
        parts.push("<h3>Technical Specifications</h3>".to_owned());
        parts.push("<ul>".to_owned());
        for (key, value) in &record.specifications {
            if key.trim().is_empty() || value.trim().is_empty() {
                continue;
            }
            parts.push(format!(
                "<li><strong>{}:</strong> {}</li>",
                title_case(key),
                value.trim()
            ));
        }
        parts.push("</ul>".to_owned());
    }

    parts.push("<h3>About Wilo</h3>".to_owned());
    parts.push(format!("<p>{BRAND_PARAGRAPH}</p>"));

    parts.join("\n")
}

/// Candidate images in record order (card image first), each passed through
/// [`validate_image_url`]; invalid ones are dropped with a log line, never
/// failing the product. Duplicates are removed by exact URL.
fn collect_images(record: &ProductRecord) -> Vec<UploadImage> {
    let mut images: Vec<UploadImage> = Vec::new();

    let mut push = |url: &str, alt: String| {
        let url = url.trim();
        if !validate_image_url(url) {
            if !url.is_empty() {
                tracing::warn!(name = record.name, url, "dropping invalid image URL");
            }
            return;
        }
        if images.iter().any(|img| img.src == url) {
            return;
        }
        images.push(UploadImage {
            src: url.to_owned(),
            alt,
        });
    };

    if let Some(card) = record.card_image_url.as_deref() {
        push(card, format!("{} - Product Image", record.name));
    }
    for (i, url) in record.product_images.iter().enumerate() {
        push(url, format!("{} - Image {}", record.name, i + 1));
    }

    images
}

fn collect_metafields(record: &ProductRecord) -> Vec<UploadMetafield> {
    let text_field = |key: &str, value: &str| UploadMetafield {
        namespace: "wilo".to_owned(),
        key: key.to_owned(),
        value: value.to_owned(),
        value_type: "single_line_text_field".to_owned(),
    };

    let mut metafields = vec![
        text_field("category", &record.category),
        text_field("subcategory", &record.subcategory),
        UploadMetafield {
            namespace: "wilo".to_owned(),
            key: "extracted_at".to_owned(),
            value: record.extracted_at.to_rfc3339(),
            value_type: "date_time".to_owned(),
        },
    ];
    if !record.source_url.is_empty() {
        metafields.push(UploadMetafield {
            namespace: "wilo".to_owned(),
            key: "source_url".to_owned(),
            value: record.source_url.clone(),
            value_type: "url".to_owned(),
        });
    }
    metafields
}

fn generate_tags(record: &ProductRecord) -> String {
    let mut tags = vec![
        "Wilo".to_owned(),
        "Pump".to_owned(),
        "German Engineering".to_owned(),
    ];
    let category = record.category.replace('.', "");
    let category = category.trim();
    if !category.is_empty() {
        tags.push(category.to_owned());
    }
    if !record.subcategory.trim().is_empty() {
        tags.push(record.subcategory.trim().to_owned());
    }
    tags.join(", ")
}

/// `"pump_type"` → `"Pump Type"`.
fn title_case(key: &str) -> String {
    key.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
