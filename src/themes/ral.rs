use egui::Color32;

/// The RAL classic colours the viewer uses, as `(code, name, colour)`.
pub const RAL_COLORS: &[(u16, &str, Color32)] = &[
    (2005, "Luminous orange", Color32::from_rgb(0xFF, 0x23, 0x01)),
    (2009, "Traffic orange", Color32::from_rgb(0xE2, 0x53, 0x03)),
    (5005, "Signal blue", Color32::from_rgb(0x1E, 0x2D, 0x6E)),
    (6027, "Light green", Color32::from_rgb(0x84, 0xC3, 0xBE)),
    (7046, "Telegrey 2", Color32::from_rgb(0x82, 0x89, 0x8F)),
    (7047, "Telegrey 4", Color32::from_rgb(0xD0, 0xD0, 0xD0)),
    (9003, "Signal white", Color32::from_rgb(0xF4, 0xF4, 0xF4)),
    (9004, "Signal black", Color32::from_rgb(0x28, 0x28, 0x28)),
    (9011, "Graphite black", Color32::from_rgb(0x1C, 0x1C, 0x1C)),
];
