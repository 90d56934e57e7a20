//! Chart colours. The same label always yields the same colour.

const PALETTE: &[(&str, &str)] = &[
    ("Attack-Pattern", "#d4e157"),
    ("Campaign", "#8e24aa"),
    ("Course-Of-Action", "#8bc34a"),
    ("Identity", "#7e57c2"),
    ("Indicator", "#ffc107"),
    ("Infrastructure", "#651fff"),
    ("Intrusion-Set", "#bf360c"),
    ("Incident", "#f44336"),
    ("Label", "#90a4ae"),
    ("Malware", "#e91e63"),
    ("Marking-Definition", "#607d8b"),
    ("Observed-Data", "#00acc1"),
    ("Organization", "#ff5722"),
    ("Report", "#4caf50"),
    ("Sector", "#2196f3"),
    ("Threat-Actor", "#880e4f"),
    ("Tool", "#03a9f4"),
    ("Vulnerability", "#795548"),
    ("Stix-Cyber-Observable", "#00bfa5"),
];

/// Fixed colour of a known entity type, otherwise a colour derived from
/// the label text.
pub fn item_color(label: &str) -> String {
    PALETTE
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(label))
        .map(|(_, colour)| colour.to_string())
        .unwrap_or_else(|| string_to_colour(label))
}

/// 32-bit rolling hash (`hash * 31 + unit` over UTF-16 units), low three
/// bytes as RGB.
pub fn string_to_colour(label: &str) -> String {
    match label {
        "" => return "#5d4037".to_string(),
        "true" => return "#2e7d32".to_string(),
        "false" => return "#d32f2f".to_string(),
        _ => {}
    }
    let hash = label.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });
    let mut colour = String::with_capacity(7);
    colour.push('#');
    for shift in [0, 8, 16] {
        colour.push_str(&format!("{:02x}", (hash >> shift) & 0xff));
    }
    colour
}
