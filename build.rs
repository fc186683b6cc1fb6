use std::fs;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Kind {
    Str,
    Color,
    Float,
    HeadingSizes,
}

// Sections and keys `Config` deserializes, with the value each expects
const SCHEMA: &[(&str, &[(&str, Kind)])] = &[
    (
        "brand",
        &[
            ("organization", Kind::Str),
            ("user_label", Kind::Str),
            ("assistant_label", Kind::Str),
        ],
    ),
    (
        "palette",
        &[
            ("primary", Kind::Color),
            ("secondary", Kind::Color),
            ("user", Kind::Color),
            ("assistant", Kind::Color),
            ("text", Kind::Color),
            ("muted", Kind::Color),
            ("code_background", Kind::Color),
        ],
    ),
    (
        "page",
        &[
            ("width", Kind::Float),
            ("height", Kind::Float),
            ("margin", Kind::Float),
            ("header_height", Kind::Float),
            ("footer_height", Kind::Float),
            ("break_threshold", Kind::Float),
        ],
    ),
    (
        "font",
        &[
            ("body", Kind::Str),
            ("mono", Kind::Str),
            ("docx_body", Kind::Str),
            ("docx_mono", Kind::Str),
            ("title_size", Kind::Float),
            ("body_size", Kind::Float),
            ("code_size", Kind::Float),
            ("small_size", Kind::Float),
            ("heading_sizes", Kind::HeadingSizes),
            ("line_height", Kind::Float),
        ],
    ),
];

fn main() {
    // Validate default config at compile time
    let config_path = "src/default_config.toml";
    println!("cargo:rerun-if-changed={}", config_path);

    let content = fs::read_to_string(config_path).expect("Failed to read default_config.toml");

    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => panic!("Invalid default_config.toml: {}", e),
    };

    for (section, value) in &table {
        let Some((_, keys)) = SCHEMA.iter().find(|(name, _)| *name == section.as_str()) else {
            panic!("Unknown section [{}] in default_config.toml", section);
        };
        let Some(entries) = value.as_table() else {
            panic!("[{}] in default_config.toml must be a table", section);
        };
        for (key, value) in entries {
            let Some((_, kind)) = keys.iter().find(|(name, _)| *name == key.as_str()) else {
                panic!("Unknown key {}.{} in default_config.toml", section, key);
            };
            if !fits_kind(*kind, value) {
                panic!(
                    "Invalid {}.{} in default_config.toml: expected {:?}, got {}",
                    section, key, kind, value
                );
            }
        }
    }
}

fn fits_kind(kind: Kind, value: &toml::Value) -> bool {
    match kind {
        Kind::Str => value.is_str(),
        Kind::Color => value.as_str().is_some_and(|hex| {
            hex.len() == 7
                && hex.starts_with('#')
                && hex[1..].chars().all(|c| c.is_ascii_hexdigit())
        }),
        Kind::Float => value.is_float(),
        Kind::HeadingSizes => value
            .as_array()
            .is_some_and(|sizes| sizes.len() == 6 && sizes.iter().all(toml::Value::is_float)),
    }
}
