//! Extract a city name and country code from geocoder address components.

use crate::domain::ports::AddressComponent;

/// City name and country code picked out of a reverse-geocode result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub name: String,
    pub country_code: String,
}

/// Pick the `locality` long name (falling back to
/// `administrative_area_level_1`) and the `country` short name.
///
/// Returns `None` when either part is missing or blank.
pub fn parse_city(components: &[AddressComponent]) -> Option<ParsedAddress> {
    let name = first_of_type(components, "locality")
        .or_else(|| first_of_type(components, "administrative_area_level_1"))
        .map(|c| c.long_name.trim())
        .filter(|n| !n.is_empty())?;
    let country_code = first_of_type(components, "country")
        .map(|c| c.short_name.trim())
        .filter(|c| !c.is_empty())?;
    Some(ParsedAddress {
        name: name.to_owned(),
        country_code: country_code.to_owned(),
    })
}

fn first_of_type<'a>(components: &'a [AddressComponent], kind: &str) -> Option<&'a AddressComponent> {
    components.iter().find(|c| c.has_type(kind))
}
