//! Products the NSIDC subsetter serves for altimetry.

/// `(code, description)` in display order.
pub const PRODUCTS: &[(&str, &str)] = &[
    // ICESat/GLAS
    ("GLAH12", "GLAS/ICESat L2 Antarctic and Greenland Ice Sheet Altimetry"),
    // Operation IceBridge
    ("ILATM2", "Icebridge Airborne Topographic Mapper Icessn Product"),
    ("ILATM1B", "Icebridge Airborne Topographic Mapper QFIT Elevation"),
    ("ILVIS1B", "Icebridge LVIS Geolocated Return Energy Waveforms"),
    ("ILVIS2", "Icebridge Land, Vegetation and Ice Sensor Elevation Product"),
    // ICESat-2/ATLAS
    ("ATL03", "Global Geolocated Photon Data"),
    ("ATL04", "Normalized Relative Backscatter"),
    ("ATL06", "Land Ice Height"),
    ("ATL07", "Sea Ice Height"),
    ("ATL08", "Land and Vegetation Height"),
    ("ATL09", "Atmospheric Layer Characteristics"),
    ("ATL10", "Sea Ice Freeboard"),
    ("ATL12", "Ocean Surface Height"),
    ("ATL13", "Inland Water Surface Height"),
];

/// Description of `code`; codes are case sensitive.
pub fn lookup(code: &str) -> Option<&'static str> {
    PRODUCTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, description)| *description)
}

pub fn codes() -> impl Iterator<Item = &'static str> {
    PRODUCTS.iter().map(|(c, _)| *c)
}
