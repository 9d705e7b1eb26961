use crate::extract::extract;
use crate::models::ListingRecord;

/// Renders a submission text as the canonical HTML listing document.
///
/// Pure function of its inputs: headline, summary keyline, then one bullet
/// per present field in fixed order. Fields the extractor missed degrade to
/// fewer bullets. `author_name` is not rendered today; the parameter is kept
/// for interface symmetry with the submission flow.
pub fn render_listing(author_name: &str, raw_text: &str) -> String {
    let _ = author_name;
    let record = extract(raw_text);

    let headline_left = record.location.clone().unwrap_or_else(|| "Dubai".to_string());
    let headline = match record.project.as_deref() {
        Some(project) => format!("{headline_left} — {project}"),
        None => headline_left,
    };

    let mut keyline_parts: Vec<String> = Vec::new();
    if let Some(bedrooms) = &record.bedrooms {
        keyline_parts.push(if bedrooms.eq_ignore_ascii_case("studio") {
            bedrooms.clone()
        } else {
            format!("{bedrooms} BR")
        });
    }
    if let Some(area) = &record.area {
        keyline_parts.push(area.replace("sq ft", "sqft"));
    }
    if let Some(price) = &record.price_formatted {
        keyline_parts.push(price.clone());
    }

    let parts = [
        format!("🏢 <b>{headline}</b>"),
        keyline_parts.join(" | "),
        String::new(),
        bullets(&record).join("\n"),
    ];

    parts
        .iter()
        .filter(|p| !p.trim().is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn bullets(record: &ListingRecord) -> Vec<String> {
    let rows: [(&str, &Option<String>); 13] = [
        ("📍 <b>Location:</b>", &record.location),
        ("🏢 <b>Project:</b>", &record.project),
        ("💰 <b>Price:</b>", &record.price_formatted),
        ("📐 <b>Area:</b>", &record.area),
        ("🛏️ <b>Bedrooms:</b>", &record.bedrooms),
        ("🛁 <b>Bathrooms:</b>", &record.bathrooms),
        ("🏗️ <b>Status:</b>", &record.status),
        ("⏳ <b>Handover:</b>", &record.handover),
        ("🅿️ <b>Parking:</b>", &record.parking),
        ("🧺 <b>Furnishing:</b>", &record.furnishing),
        ("🌇 <b>View:</b>", &record.view),
        ("⬆️ <b>Floor:</b>", &record.floor),
        ("💳 <b>Payment plan:</b>", &record.payment_plan),
    ];

    rows.iter()
        .filter_map(|(label, value)| {
            value.as_ref().map(|v| format!("{label} {v}"))
        })
        .collect()
}
