//! Search query synthesis from a vendor profile.

use scout_common::VendorProfile;

pub const DEFAULT_RADIUS_KM: u32 = 50;

const SNACK_TRIGGERS: &[&str] = &["vada pav", "snacks", "street food"];
const BEVERAGE_TRIGGERS: &[&str] = &["juice", "drinks", "beverages"];
const STUDENT_TRIGGERS: &[&str] = &["college", "university", "student"];

/// Normalised terms every query template draws from.
struct Terms {
    location: String,
    business: String,
    city: String,
}

impl Terms {
    fn from_vendor(vendor: &VendorProfile) -> Self {
        let location = vendor.location_lower();
        let business = vendor.business_lower();
        let city = match location.rsplit_once(',') {
            Some((_, tail)) => tail.trim().to_string(),
            None => location.clone(),
        };
        Self {
            location,
            business,
            city,
        }
    }

    fn business_mentions(&self, triggers: &[&str]) -> bool {
        triggers.iter().any(|t| self.business.contains(t))
    }
}

/// Ordered queries for one discovery run. Duplicates are kept.
///
/// ```
/// use scout_common::VendorProfile;
/// use scout_discovery::query::synthesize_queries;
///
/// let vendor = VendorProfile::new("v1", "Pune", "tea");
/// let queries = synthesize_queries(&vendor, 0, 2025);
/// assert_eq!(queries[0], "upcoming food festivals pune vendor opportunities 2025 2026");
/// assert_eq!(queries.len(), 5);
/// ```
pub fn synthesize_queries(vendor: &VendorProfile, radius_km: u32, year: i32) -> Vec<String> {
    let terms = Terms::from_vendor(vendor);
    let (location, business, city) = (&terms.location, &terms.business, &terms.city);

    let mut queries = vec![
        format!(
            "upcoming food festivals {city} vendor opportunities {year} {}",
            year + 1
        ),
        format!("street food events {location} vendor registration"),
        format!("local markets {city} food stalls near me"),
        format!("community events {location} food vendors"),
        format!("{business} festivals {city} vendor application"),
    ];

    if terms.business_mentions(SNACK_TRIGGERS) {
        queries.extend([
            format!("street food festival {city} vendor booth {business}"),
            format!("food truck events {location} {business}"),
            format!("cultural food events {city} {business} stalls"),
        ]);
    }
    if terms.business_mentions(BEVERAGE_TRIGGERS) {
        queries.extend([
            format!("summer festivals {city} beverage vendors {business}"),
            format!("outdoor markets {location} drink stalls"),
            format!("food and drink events {city} {business}"),
        ]);
    }
    if terms.business_mentions(STUDENT_TRIGGERS) {
        queries.extend([
            format!("college fest {city} food vendors {business}"),
            format!("university events {location} vendor registration"),
            format!("student festivals {city} {business} stalls"),
        ]);
    }

    if radius_km > 0 {
        queries.push(format!(
            "food events near {location} within {radius_km}km vendor opportunities"
        ));
    }

    queries
}
