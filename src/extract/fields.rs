use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::ListingRecord;

/// Listing fields the extractor knows how to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Location,
    Project,
    Bedrooms,
    Bathrooms,
    Area,
    Price,
    Status,
    Parking,
    Furnishing,
    View,
    Floor,
    Handover,
    PaymentPlan,
}

/// Resolution recipe for one field: ordered `key: value` synonyms (English
/// and Russian), then an optional whole-text pattern whose first capture
/// group is the value.
struct FieldSpec {
    field: Field,
    keys: &'static [&'static str],
    pattern: Option<Regex>,
}

impl FieldSpec {
    fn new(field: Field, keys: &'static [&'static str], pattern: Option<&str>) -> Self {
        Self {
            field,
            keys,
            pattern: pattern.map(|p| Regex::new(p).unwrap()),
        }
    }

    fn resolve(&self, kv: &HashMap<String, String>, one_line: &str) -> Option<String> {
        for key in self.keys {
            if let Some(value) = kv.get(*key) {
                if !value.is_empty() {
                    return Some(value.clone());
                }
            }
        }
        let pattern = self.pattern.as_ref()?;
        pattern
            .captures(one_line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

lazy_static! {
    static ref FIELD_SPECS: Vec<FieldSpec> = vec![
        FieldSpec::new(
            Field::Location,
            &["location", "район", "community", "district", "локация"],
            Some(r"(?i)\b(dubai marina|jvc|downtown|business bay|diera|creek|palm|dubai hills|jbr|jvt|mudon|mirdif|sobha hartland|arabian ranches)\b"),
        ),
        FieldSpec::new(
            Field::Project,
            &["project", "name", "title", "заголовок", "проект", "object"],
            None,
        ),
        FieldSpec::new(
            Field::Bedrooms,
            &["bedrooms", "bedroom", "br", "спальни"],
            Some(r"(?i)(\d+)\s*(br|bed|bedroom|bedrooms|спальн)"),
        ),
        FieldSpec::new(
            Field::Bathrooms,
            &["bathrooms", "baths", "wc", "санузлы"],
            Some(r"(?i)(\d+)\s*(bath|baths|wc|сануз)"),
        ),
        FieldSpec::new(
            Field::Area,
            &["area", "size", "площадь"],
            Some(r"(?i)(\d[\d\., ]{2,})\s*(sq\.?ft|sqft|sqm|m2)"),
        ),
        FieldSpec::new(
            Field::Price,
            &["price", "цена", "стоимость"],
            Some(r"(?i)(\d[\d\., ]{2,})\s*(aed|dirham|د\.إ|dh)?"),
        ),
        FieldSpec::new(Field::Status, &["status", "статус"], None),
        FieldSpec::new(
            Field::Parking,
            &["parking", "парковка"],
            Some(r"(?i)parking[:\s]*([0-9]+|yes|no)"),
        ),
        FieldSpec::new(
            Field::Furnishing,
            &["furnishing", "furnished", "мебель"],
            Some(r"(?i)(furnished|unfurnished|partly furnished)"),
        ),
        FieldSpec::new(Field::View, &["view", "вид"], None),
        FieldSpec::new(Field::Floor, &["floor", "этаж"], None),
        FieldSpec::new(Field::Handover, &["handover"], Some(r"(?i)(q[1-4]\s*\d{4})")),
        FieldSpec::new(
            Field::PaymentPlan,
            &[
                "payment plan",
                "payment",
                "installment",
                "installments",
                "рассрочка",
                "платежный план",
            ],
            None,
        ),
    ];

    static ref AREA_UNIT_RX: Regex = Regex::new(r"(?i)(sq\.?ft|sqft|sqm|m2)").unwrap();
    static ref AMOUNT_RX: Regex = Regex::new(r"(\d[\d\., ]*)").unwrap();
    static ref OFF_PLAN_RX: Regex = Regex::new(r"(?i)off-?plan").unwrap();
    static ref VACANT_RX: Regex = Regex::new(r"(?i)vacant|ready").unwrap();
}

/// Parses an integer amount out of strings like `"AED 3,050,000"` or
/// `"3 050 000"`. None when the string carries no digits.
pub fn parse_amount(s: &str) -> Option<i64> {
    let m = AMOUNT_RX.find(s)?;
    let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Formats `3050000` as `"AED 3 050 000"`. None and zero render as the
/// empty string: no price, not a zero price.
pub fn format_price_aed(amount: Option<i64>) -> String {
    match amount {
        Some(n) if n > 0 => format!("AED {}", group_thousands(n)),
        _ => String::new(),
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Lowercased `key: value` lines; a later duplicate key overwrites an
/// earlier one.
fn parse_kv(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        if let Some((key, value)) = line.split_once(':') {
            map.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }
    map
}

/// Extracts a [`ListingRecord`] from free text.
///
/// Each field tries its `key: value` synonyms first, then its regex against
/// the text collapsed to one line. A miss is an absent field, never an
/// error.
pub fn extract(raw_text: &str) -> ListingRecord {
    let src = raw_text.trim();
    let one_line = src.split_whitespace().collect::<Vec<_>>().join(" ");
    let kv = parse_kv(src);

    let mut record = ListingRecord::default();
    let mut price_src = None;

    for spec in FIELD_SPECS.iter() {
        let value = spec.resolve(&kv, &one_line);
        match spec.field {
            Field::Location => record.location = value,
            Field::Project => record.project = value,
            Field::Bedrooms => record.bedrooms = value,
            Field::Bathrooms => record.bathrooms = value,
            Field::Area => record.area = value,
            Field::Price => price_src = value,
            Field::Status => record.status = value,
            Field::Parking => record.parking = value,
            Field::Furnishing => record.furnishing = value,
            Field::View => record.view = value,
            Field::Floor => record.floor = value,
            Field::Handover => record.handover = value,
            Field::PaymentPlan => record.payment_plan = value,
        }
    }

    // Default-unit policy: an area without a recognized unit is taken as sqft.
    if let Some(area) = record.area.take() {
        record.area = Some(if AREA_UNIT_RX.is_match(&area) {
            area
        } else {
            format!("{area} sqft")
        });
    }

    record.price_amount = parse_amount(price_src.as_deref().unwrap_or(&one_line));
    record.price_formatted = match record.price_amount {
        Some(n) if n > 0 => Some(format_price_aed(Some(n))),
        _ => None,
    };

    if record.status.is_none() {
        record.status = if OFF_PLAN_RX.is_match(&one_line) {
            Some("Off-plan".to_string())
        } else if VACANT_RX.is_match(&one_line) {
            Some("Vacant".to_string())
        } else {
            None
        };
    }

    record
}
